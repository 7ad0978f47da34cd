use gamepad_bridge::{Gamepad, Manager, VirtualBackend, VirtualDeviceSpec};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .init();

    // Plug a virtual controller before the first scan
    let mut backend = VirtualBackend::new();
    let id = backend.plug(VirtualDeviceSpec::new("Demo Virtual Pad", 4, 8).with_ids(0x045e, 0x028e));

    let mut mgr = Manager::new(backend);
    mgr.set_device_attach_func(Some(Box::new(|pad: &Gamepad| {
        println!("(Virtual) {} attached as #{}", pad.description()?, pad.device_id()?);
        Ok(())
    })));
    mgr.set_device_remove_func(Some(Box::new(|pad: Option<&Gamepad>| {
        if let Some(pad) = pad {
            println!("(Virtual) #{} removed, last axes {:?}", pad.id(), pad.axis_states()?);
        }
        Ok(())
    })));
    mgr.set_button_down_func(Some(Box::new(|pad: &Gamepad, button: u32, at: f64| {
        println!("(Virtual) #{} button {button} pressed at {at:.3}s", pad.id());
        Ok(())
    })));
    mgr.set_axis_move_func(Some(Box::new(
        |pad: &Gamepad, axis: u32, value: f32, last: f32, _: f64| {
            println!("(Virtual) #{} axis {axis}: {last} -> {value}", pad.id());
            Ok(())
        },
    )));

    mgr.init()?;
    mgr.detect_devices()?;

    // Inject some sample input
    let backend = mgr.backend_mut();
    backend.move_axis(id, 0, 0.75);
    backend.press_button(id, 1);
    mgr.process_events()?;

    let pad = mgr.device_at_index(0).expect("virtual pad is attached");
    println!("(Virtual) snapshot: {:?}", mgr.snapshot().get(id));

    mgr.backend_mut().unplug(id)?;
    mgr.process_events()?;
    println!("(Virtual) after removal: {}", pad.num_axes().unwrap_err());

    mgr.shutdown();
    Ok(())
}
