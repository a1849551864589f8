use colored::Colorize;
use padforge_device::{
    encode_axis, encode_continuous_pov, Axis, Capabilities, DeviceController, DeviceInfo,
    PovDirection, SlotId, VirtualDriver,
};

use crate::error::CliError;
use crate::{print_debug, print_info, print_warning};

const AXIS_SWEEP: [f32; 5] = [-1.0, -0.5, 0.0, 0.5, 1.0];
const HAT_SWEEP: [PovDirection; 5] = [
    PovDirection::North,
    PovDirection::East,
    PovDirection::South,
    PovDirection::West,
    PovDirection::Neutral,
];
const ANGLE_SWEEP: [f32; 5] = [0.0, 90.0, 180.0, 270.0, -1.0];

fn describe(caps: &Capabilities) -> String {
    let axes: Vec<&str> = caps.axes.iter().map(Axis::name).collect();
    format!(
        "{} buttons, {} hats, {} continuous hats, axes [{}]",
        caps.buttons,
        caps.discrete_povs,
        caps.continuous_povs,
        axes.join(", ")
    )
}

fn print_device(info: &DeviceInfo) {
    print_info!(
        "slot {:>2}: {:<7} {}",
        info.id,
        info.status.to_string().bold(),
        describe(&info.capabilities)
    );
}

/// Print every existing slot of the driver.
pub(crate) fn list<D: VirtualDriver>(driver: D) -> Result<(), CliError> {
    let mut controller = DeviceController::new(driver);
    let versions = controller.initialize()?;
    print_debug!(
        "driver version {}, library version {}",
        versions.driver,
        versions.library
    );

    let devices = controller.enumerate_devices();
    if devices.is_empty() {
        print_warning!("no virtual joystick slots found");
        return Ok(());
    }
    devices.iter().for_each(print_device);
    Ok(())
}

/// Acquire `slot`, drive every declared control through its range and
/// release the slot again.
pub(crate) fn probe<D: VirtualDriver>(driver: D, slot: u8) -> Result<(), CliError> {
    let id = SlotId::new(slot).ok_or(CliError::InvalidSlot(slot))?;
    let mut controller = DeviceController::new(driver);
    controller.initialize()?;
    controller.acquire(id)?;

    let info = controller.get_device_info(id);
    print_device(&info);
    let result = sweep(&controller, id, &info.capabilities);
    controller.release(id);
    result?;

    print_info!("slot {id} released");
    Ok(())
}

fn sweep<D: VirtualDriver>(
    controller: &DeviceController<D>,
    id: SlotId,
    caps: &Capabilities,
) -> Result<(), CliError> {
    for axis in caps.axes.iter() {
        for value in AXIS_SWEEP {
            controller.set_axis(id, axis, value)?;
            print_debug!("{axis} {value:+.1} -> {}", encode_axis(value));
        }
        controller.set_axis(id, axis, 0.0)?;
    }

    for button in 1..=caps.buttons {
        controller.set_button(id, button, true)?;
        controller.set_button(id, button, false)?;
    }
    if caps.buttons > 0 {
        print_debug!("pressed and released {} buttons", caps.buttons);
    }

    for pov in 1..=caps.discrete_povs {
        for direction in HAT_SWEEP {
            controller.set_discrete_pov(id, pov, direction)?;
            print_debug!("hat {pov} {direction:?} -> {}", direction.code());
        }
    }

    for pov in 1..=caps.continuous_povs {
        for angle in ANGLE_SWEEP {
            controller.set_continuous_pov(id, pov, angle)?;
            print_debug!("hat {pov} {angle}° -> {}", encode_continuous_pov(angle));
        }
    }

    controller.reset(id)?;
    print_info!("slot {id} answered every control");
    Ok(())
}
