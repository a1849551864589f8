use codspeed_criterion_compat::{black_box, criterion_group, criterion_main, Criterion};
use padforge_device::{
    encode_axis, encode_continuous_pov, Axis, AxisSet, Capabilities, DeviceController,
    SimulatedDriver, SlotId,
};

fn bench_encode_axis(c: &mut Criterion) {
    c.bench_function("encode_axis_sweep", |b| {
        b.iter(|| {
            let mut acc = 0i64;
            for step in 0..=200u32 {
                let v = -1.0 + step as f32 * 0.01;
                acc += i64::from(encode_axis(black_box(v)));
                acc += i64::from(encode_continuous_pov(black_box(v * 180.0)));
            }
            black_box(acc);
        })
    });
}

fn bench_controller_frame(c: &mut Criterion) {
    let id = SlotId::new(1).expect("valid slot");
    let driver = SimulatedDriver::new().with_slot(
        id,
        Capabilities {
            buttons: 16,
            discrete_povs: 0,
            continuous_povs: 1,
            axes: AxisSet::all(),
        },
    );
    let mut controller = DeviceController::new(driver);
    controller.initialize().expect("driver enabled");
    controller.acquire(id).expect("slot free");

    // One input-loop frame: every axis, a few buttons, one hat.
    c.bench_function("controller_frame", |b| {
        b.iter(|| {
            for (i, axis) in Axis::ALL.iter().enumerate() {
                let _ = controller.set_axis(id, *axis, black_box(i as f32 / 8.0));
            }
            for button in 1..=4u8 {
                let _ = controller.set_button(id, button, black_box(button % 2 == 0));
            }
            let _ = controller.set_continuous_pov(id, 1, black_box(45.0));
        })
    });
}

criterion_group!(benches, bench_encode_axis, bench_controller_frame);
criterion_main!(benches);
