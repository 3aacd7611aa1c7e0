#![no_main]

use libfuzzer_sys::fuzz_target;
use radar_rs::radar::response::{interpret, interpret_for_model};
use radar_rs::radar::SensorModel;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let (control, command, payload) = (data[0], data[1], &data[2..]);
    let _ = interpret(control, command, payload);
    for model in [SensorModel::Mr60bha1, SensorModel::Mr24hpc1, SensorModel::Unknown] {
        let _ = interpret_for_model(model, control, command, payload);
    }
});
