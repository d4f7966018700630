use std::fs;
use std::process::Command;

use scene_script::Color;
use scene_script::testing::ScriptBuilder;

const FILL: u16 = 0x01;

#[test]
fn writes_a_png_of_the_root_script() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("root.bin");
    let child = dir.path().join("child.bin");
    let out = dir.path().join("frame.png");
    fs::write(
        &root,
        ScriptBuilder::new()
            .fill_color(Color::rgba(255, 0, 0, 255))
            .draw_rect(FILL, 4.0, 4.0)
            .translate(8.0, 0.0)
            .draw_script("child")
            .finish(),
    )
    .unwrap();
    fs::write(
        &child,
        ScriptBuilder::new()
            .fill_color(Color::rgba(0, 255, 0, 255))
            .draw_rect(FILL, 4.0, 4.0)
            .finish(),
    )
    .unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_render_script"))
        .arg("--out")
        .arg(&out)
        .args(["--size", "16x8", "--clear", "0,0,255,255"])
        .arg(&root)
        .arg(format!("child={}", child.display()))
        .status()
        .unwrap();
    assert!(status.success());

    let image = image::open(&out).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (16, 8));
    assert_eq!(image.get_pixel(1, 1).0, [255, 0, 0, 255]);
    assert_eq!(image.get_pixel(9, 1).0, [0, 255, 0, 255]);
    assert_eq!(image.get_pixel(14, 6).0, [0, 0, 255, 255]);
}

#[test]
fn missing_output_flag_fails() {
    let status = Command::new(env!("CARGO_BIN_EXE_render_script"))
        .arg("root.bin")
        .status()
        .unwrap();
    assert!(!status.success());
}
