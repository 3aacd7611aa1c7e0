use criterion::{black_box, criterion_group, criterion_main, Criterion};
use radar_rs::radar::frame::{decode_frame, encode_frame};
use radar_rs::radar::response::interpret;

fn hex_to_bytes(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

fn benchmark_encode_frame(c: &mut Criterion) {
    c.bench_function("encode_frame", |b| {
        b.iter(|| {
            let frame = encode_frame(black_box(0x85), black_box(0x82), black_box(&[0x0F]));
            let _ = black_box(frame);
        })
    });
}

fn benchmark_decode_frame(c: &mut Criterion) {
    // Heart rate response, 72 bpm.
    let mut data = hex_to_bytes("5359858200020048");
    let checksum = data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    data.extend_from_slice(&[checksum, 0x54, 0x43]);

    c.bench_function("decode_frame", |b| {
        b.iter(|| {
            let result = decode_frame(black_box(&data));
            let _ = black_box(result);
        })
    });

    let waveform = encode_frame(0x81, 0x05, &[0x80; 255]).unwrap();
    c.bench_function("decode_frame_waveform", |b| {
        b.iter(|| {
            let result = decode_frame(black_box(&waveform));
            let _ = black_box(result);
        })
    });
}

fn benchmark_interpret(c: &mut Criterion) {
    c.bench_function("interpret_heart_rate", |b| {
        b.iter(|| {
            let reading = interpret(black_box(0x85), black_box(0x82), black_box(&[0x00, 0x48]));
            let _ = black_box(reading);
        })
    });
}

criterion_group!(benches, benchmark_encode_frame, benchmark_decode_frame, benchmark_interpret);
criterion_main!(benches);
