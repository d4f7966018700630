use scene_driver::{DriverConfig, DriverError, RendererHandle};
use scene_script::Color;
use scene_script::testing::ScriptBuilder;

const FILL: u16 = 0x01;

fn spawn(width: u32, height: u32) -> RendererHandle {
    RendererHandle::spawn(&DriverConfig::new(width, height, 5)).unwrap()
}

fn red_rect() -> Vec<u8> {
    ScriptBuilder::new()
        .translate(5.0, 6.0)
        .fill_color(Color::rgba(255, 0, 0, 255))
        .draw_rect(FILL, 10.0, 12.0)
        .finish()
}

#[test]
fn publishes_the_red_rectangle() {
    let handle = spawn(32, 32);
    handle.submit_root(&red_rect()).unwrap();
    handle.flush().unwrap();

    let frame = handle.latest_frame().unwrap().unwrap();
    assert_eq!((frame.width(), frame.height()), (32, 32));
    assert_eq!(frame.pixel(10, 10), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(handle.script_count(), 1);
    handle.stop().unwrap();
}

#[test]
fn commands_apply_in_order() {
    let handle = spawn(8, 8);
    let blue = ScriptBuilder::new()
        .fill_color(Color::rgba(0, 0, 255, 255))
        .draw_rect(FILL, 8.0, 8.0)
        .finish();
    handle.submit_root(&red_rect()).unwrap();
    handle.submit_root(&blue).unwrap();
    handle.set_clear_color(Color::WHITE).unwrap();
    handle.flush().unwrap();

    let frame = handle.latest_frame().unwrap().unwrap();
    assert_eq!(frame.pixel(4, 4), Some([0, 0, 255, 255]));
    handle.stop().unwrap();
}

#[test]
fn nothing_is_published_without_a_root() {
    let handle = spawn(8, 8);
    handle
        .submit("orphan", &ScriptBuilder::new().draw_rect(FILL, 2.0, 2.0).finish())
        .unwrap();
    handle.flush().unwrap();
    assert!(handle.latest_frame().unwrap().is_none());
    assert_eq!(handle.frames_rendered(), 0);
}

#[test]
fn malformed_scripts_are_rejected_before_queueing() {
    let handle = spawn(8, 8);
    let mut truncated = red_rect();
    truncated.truncate(truncated.len() - 2);
    assert!(matches!(
        handle.submit_root(&truncated),
        Err(DriverError::Decode(_))
    ));
    assert!(matches!(
        handle.submit_batch(&[("_root_", red_rect()), ("bad", truncated)]),
        Err(DriverError::Decode(_))
    ));
    handle.flush().unwrap();
    assert_eq!(handle.script_count(), 0);
}

#[test]
fn reset_and_delete_drop_scripts() {
    let handle = spawn(8, 8);
    let child = ScriptBuilder::new().draw_rect(FILL, 2.0, 2.0).finish();
    handle
        .submit_batch(&[("_root_", red_rect()), ("child", child)])
        .unwrap();
    handle.flush().unwrap();
    assert_eq!(handle.script_count(), 2);

    handle.delete("child").unwrap();
    handle.flush().unwrap();
    assert_eq!(handle.script_count(), 1);

    handle.reset().unwrap();
    handle.flush().unwrap();
    assert_eq!(handle.script_count(), 0);
}

#[test]
fn resize_redraws_at_the_new_size() {
    let handle = spawn(8, 8);
    handle.submit_root(&red_rect()).unwrap();
    handle.flush().unwrap();
    handle.resize(16, 24).unwrap();
    handle.flush().unwrap();

    let frame = handle.latest_frame().unwrap().unwrap();
    assert_eq!((frame.width(), frame.height()), (16, 24));
    assert_eq!(frame.pixel(10, 17), Some([255, 0, 0, 255]));
}

#[test]
fn invalid_viewport_is_clamped() {
    let config = DriverConfig::new(0, 0, 0);
    assert_eq!((config.viewport_width, config.viewport_height), (1, 1));
    let handle = RendererHandle::spawn(&config).unwrap();
    handle.stop().unwrap();
}
