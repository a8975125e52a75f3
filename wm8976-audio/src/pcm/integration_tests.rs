//! End-to-end playback bring-up in software.
//!
//! Wires the codec driver over the bit-banged bus (or a recording link)
//! together with a DMA stream and checks the whole sequence the audio layer
//! runs for one playback session:
//!
//! ```text
//! probe ─► configure_codec ─► set_pll ─► unmute
//!   open ─► hw_params ─► prepare ─► Start ─► [IRQ × n] ─► Stop ─► close
//! ```

use crate::codec::cache::tests::MockLink;
use crate::codec::{Register, Wm8976};
use crate::control::{BiasLevel, SampleFormat};
use crate::l3::tests::{decode, make_bus, Trace};
use crate::machine::configure_codec;
use crate::pcm::engine::tests::{make_stream, Op};
use crate::pcm::{Flow, HwParams, PeriodElapsed, PeriodQueue, StreamState, Trigger};
use std::cell::Cell;
use std::vec::Vec;

const PCLK: u32 = 50_000_000;
const MCLK: u32 = 12_000_000;

#[test]
fn codec_bring_up_over_bit_banged_bus() {
    let trace = Trace::default();
    let mut codec = Wm8976::new(make_bus(&trace));
    codec.probe().unwrap();

    // Reset frame first, then POWER1 = 0x0DF.
    let bytes = decode(&trace.borrow());
    assert_eq!(&bytes[..4], [0x00, 0x00, 0x02, 0xDF]);
    assert_eq!(bytes.len(), 7 * 2);
}

#[test]
fn headphone_volume_frame_on_the_wire() {
    let trace = Trace::default();
    let mut codec = Wm8976::new(make_bus(&trace));
    codec.write(Register::HpVolL, 0x039).unwrap();
    assert_eq!(decode(&trace.borrow()), [0x69, 0x39]);
    assert_eq!(codec.register(Register::HpVolL), 0x039);
}

#[test]
fn playback_session() {
    // ── Codec side ──
    let mut codec = Wm8976::new(MockLink::default());
    codec.probe().unwrap();
    let clocking = configure_codec(&mut codec, SampleFormat::S16Le, 44_100, PCLK).unwrap();
    codec.set_pll(MCLK, clocking.sysclk).unwrap();
    codec.digital_mute(false).unwrap();

    assert_eq!(codec.register(Register::Iface), 0x010);
    assert_eq!(codec.register(Register::Power1) & 0x020, 0x020);
    assert_eq!(codec.bias_level(), BiasLevel::On);

    // ── Stream side ──
    let (stream, log) = make_stream(PeriodQueue::<4>::new());
    stream.open().unwrap();
    stream.hw_params(HwParams::s16_stereo(8192, 2048)).unwrap();
    stream.prepare().unwrap();
    stream.trigger(Trigger::Start).unwrap();

    // Two laps of the ring, draining the queue as the audio task would.
    let mut played = Vec::new();
    for _ in 0..8 {
        stream.on_complete();
        while let Some(period) = stream.sink().pop() {
            played.push(period.offset);
        }
    }
    assert_eq!(played, [2048, 4096, 6144, 0, 2048, 4096, 6144, 0]);
    assert_eq!(stream.pointer(), 0);
    assert_eq!(stream.sink().overruns(), 0);

    stream.trigger(Trigger::Stop).unwrap();
    stream.close().unwrap();
    assert_eq!(stream.state(), StreamState::Idle);

    let starts = log.borrow().iter().filter(|op| **op == Op::Start).count();
    assert_eq!(starts, 1 + 8);
    assert_eq!(log.borrow().last(), Some(&Op::IrqFree));

    // ── Power down ──
    codec.digital_mute(true).unwrap();
    codec.suspend().unwrap();
    assert_eq!(codec.register(Register::Power1), 0);
}

#[test]
fn pause_and_release_keep_position() {
    let (stream, _) = make_stream(PeriodQueue::<8>::new());
    stream.open().unwrap();
    stream.hw_params(HwParams::s16_stereo(8192, 2048)).unwrap();
    stream.prepare().unwrap();
    stream.trigger_raw(1).unwrap();

    stream.on_complete();
    stream.trigger_raw(3).unwrap();
    assert_eq!(stream.state(), StreamState::Paused);
    assert_eq!(stream.pointer(), 512);

    stream.trigger_raw(4).unwrap();
    stream.on_complete();
    assert_eq!(stream.pointer(), 1024);
    assert_eq!(stream.state(), StreamState::Running);
}

#[test]
fn upper_layer_stops_at_end_of_data() {
    let remaining = Cell::new(3u32);
    let (stream, log) = make_stream(|_: PeriodElapsed| {
        let left = remaining.get().saturating_sub(1);
        remaining.set(left);
        if left == 0 {
            Flow::Stop
        } else {
            Flow::Continue
        }
    });
    stream.open().unwrap();
    stream.hw_params(HwParams::s16_stereo(4096, 1024)).unwrap();
    stream.prepare().unwrap();
    stream.trigger(Trigger::Start).unwrap();

    for _ in 0..3 {
        stream.on_complete();
    }
    assert_eq!(stream.state(), StreamState::Idle);
    assert_eq!(stream.snapshot().offset, 3072);

    // Late interrupt after the stop: position moves, nothing restarts.
    log.borrow_mut().clear();
    stream.on_complete();
    assert!(log.borrow().iter().all(|op| *op != Op::Start));
    assert_eq!(stream.snapshot().offset, 0);
}

#[test]
fn resume_after_power_loss() {
    let mut codec = Wm8976::new(MockLink::default());
    codec.probe().unwrap();
    configure_codec(&mut codec, SampleFormat::S24Le, 32_000, PCLK).unwrap();
    let iface = codec.register(Register::Iface);
    let add = codec.register(Register::Add);

    codec.suspend().unwrap();
    codec.resume().unwrap();

    assert_eq!(codec.register(Register::Iface), iface);
    assert_eq!(codec.register(Register::Add), add);
    let link = codec.release();
    assert_eq!(link.last(Register::Iface), Some(0x050));
    assert_eq!(link.last(Register::Power3), Some(0x0FF));
}
