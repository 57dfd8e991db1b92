use crate::camera::Intrinsics;
use crate::decoder::SourceInfo;
use crate::shared::constants;

pub fn banner() {
    println!("{} ver.{}", constants::APP_NAME, constants::APP_VERSION);
    println!();
}

pub fn video_info(info: &SourceInfo, output_size: (u32, u32)) {
    println!("Video size: {}x{}", info.width, info.height);
    println!("Output size: {}x{}", output_size.0, output_size.1);
    println!("Frame number: {}", info.frame_count);
    println!();
}

pub fn calibration(title: &str, k: &Intrinsics, with_distortion: bool) {
    println!("{}:", title);
    println!("{}", projection_line(k));
    if with_distortion {
        println!(
            "k1 = {}, k2 = {}, p1 = {}, p2 = {}, k3 = {}, k4 = {}, k5 = {}, k6 = {}",
            k.k1, k.k2, k.p1, k.p2, k.k3, k.k4, k.k5, k.k6
        );
    }
    println!();
}

fn projection_line(k: &Intrinsics) -> String {
    format!("fx = {}, fy = {}, cx = {}, cy = {}", k.fx, k.fy, k.cx, k.cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_line() {
        let k = Intrinsics::new(400.0, 400.0, 120.0, 160.5);
        assert_eq!(projection_line(&k), "fx = 400, fy = 400, cx = 120, cy = 160.5");
    }
}
