//! Initialization, register, and basic APU tests

use super::*;
use crate::apu::constants::{NOISE_PERIOD_TABLE, POWER_ON_REGISTERS};
use crate::apu::{Apu, Channel, FrameMode, NegateMode};
use crate::bus::MemoryMappedDevice;

// ========================================
// Initialization Tests
// ========================================

#[test]
fn test_apu_initialization() {
    let apu = Apu::new();
    // All channels start disabled
    assert!(!apu.pulse1.enabled);
    assert!(!apu.pulse2.enabled);
    assert!(!apu.triangle.enabled);
    assert!(!apu.noise.enabled);
    assert!(!apu.dmc.enabled);
    // Sweep units negate differently
    assert_eq!(apu.pulse1.sweep.negate_mode, NegateMode::OnesComplement);
    assert_eq!(apu.pulse2.sweep.negate_mode, NegateMode::TwosComplement);
    // Counters are empty
    assert_eq!(apu.triangle.linear_counter.count, 0);
    assert_eq!(apu.triangle.length_counter.counter, 0);
    assert_eq!(apu.noise.length_counter.counter, 0);
    assert_eq!(apu.cycles(), 0);
    assert_eq!(apu.frame_mode(), FrameMode::FourStep);
    assert_eq!(apu.current_output(), 0.0);
}

#[test]
fn test_apu_default() {
    let apu = Apu::default();
    assert_eq!(apu.peek_status(), 0x00);
    assert_eq!(apu.sample_rate(), 44_100);
    assert_eq!(apu.cpu_clock(), 1_789_773);
}

#[test]
fn test_apu_reset() {
    let mut apu = Apu::new();
    apu.write(STATUS, 0x01);
    apu.write(PULSE1_CONTROL, 0x80);
    apu.write(PULSE1_LENGTH, 0x08);
    apu.set_volume(0.25);
    apu.load_sample_memory(0xC000, &[0x12]);
    run_cycles(&mut apu, 100);

    assert!(apu.pulse1.enabled);

    apu.reset();

    assert!(!apu.pulse1.enabled);
    assert_eq!(apu.pulse1.duty, 0);
    assert_eq!(apu.cycles(), 0);
    assert_eq!(apu.peek_status(), 0x00);
    // Configuration and sample memory survive a reset
    assert_eq!(apu.volume(), 0.25);
    assert_eq!(apu.sample_bus_mut().read(0xC000), 0x12);
}

#[test]
fn test_power_on_state() {
    let mut apu = Apu::new();
    apu.power_on();

    // Tone channels enabled, DMC disabled
    assert!(apu.pulse1.enabled);
    assert!(apu.pulse2.enabled);
    assert!(apu.triangle.enabled);
    assert!(apu.noise.enabled);
    assert!(!apu.dmc.enabled);

    // Constant volume 0 with halted length counters
    assert!(apu.pulse1.envelope.constant_volume);
    assert_eq!(apu.pulse1.envelope.volume(), 0);
    assert!(apu.pulse1.length_counter.halt);
    assert!(apu.noise.length_counter.halt);
    assert!(apu.triangle.linear_counter.control);

    // IRQ inhibited, so no frame IRQ ever shows up
    assert!(apu.frame_counter.irq_inhibited());
    run_cycles(&mut apu, 30_000);
    assert!(!apu.frame_irq_pending());

    // Pulse and noise are silent; the triangle DAC holds its first step,
    // so the mix is a constant level with no tone in it
    assert_eq!(apu.pulse1_output(), 0);
    assert_eq!(apu.pulse2_output(), 0);
    assert_eq!(apu.noise_output(), 0);
    assert_eq!(apu.dmc_output(), 0);
    let level = apu.current_output();
    apu.clock(5000);
    assert!(apu.take_samples().iter().all(|&s| s == level));
}

#[test]
fn test_power_on_table_matches_register_groups() {
    assert_eq!(&POWER_ON_REGISTERS[0..4], &[0x30, 0x08, 0x00, 0x00]);
    assert_eq!(&POWER_ON_REGISTERS[4..8], &[0x30, 0x08, 0x00, 0x00]);
    assert_eq!(&POWER_ON_REGISTERS[8..12], &[0x80, 0x00, 0x00, 0x00]);
    assert_eq!(&POWER_ON_REGISTERS[12..16], &[0x30, 0x00, 0x00, 0x00]);
    assert_eq!(&POWER_ON_REGISTERS[16..20], &[0x00; 4]);
}

#[test]
fn test_independent_instances() {
    let mut a = Apu::new();
    let b = Apu::new();
    a.write(STATUS, 0x01);
    a.write(PULSE1_LENGTH, 0x08);

    assert!(a.pulse1.is_active());
    assert!(!b.pulse1.is_active());
}

// ========================================
// Pulse 1 Register Tests ($4000-$4003)
// ========================================

#[test]
fn test_write_pulse1_registers() {
    let mut apu = Apu::new();

    // Enable Pulse 1 first
    apu.write(STATUS, 0x01);

    apu.write(0x4000, 0xBF); // Duty=2 (50%), envelope loop, constant volume, volume=15
    apu.write(0x4001, 0x08); // Sweep disabled, negate, shift=0
    apu.write(0x4002, 0xA9); // Timer low byte
    apu.write(0x4003, 0x0F); // Length counter index=1, timer high=7

    assert_eq!(apu.pulse1.duty, 2);

    // Envelope settings
    assert!(apu.pulse1.envelope.constant_volume);
    assert!(apu.pulse1.envelope.loop_flag);
    assert_eq!(apu.pulse1.envelope.period, 15);

    // 11-bit timer period: (0x0F & 0x07) << 8 | 0xA9
    assert_eq!(apu.pulse1.timer.period, 0x7A9);

    // Length index 1 loads 254
    assert_eq!(apu.pulse1.length_counter.value(), 254);
    assert!(apu.pulse1.enabled);
}

#[test]
fn test_read_pulse1_registers_return_zero() {
    let mut apu = Apu::new();
    apu.write(0x4000, 0xBF);

    // Pulse 1 registers are write-only
    for addr in 0x4000..=0x4003 {
        assert_eq!(apu.read(addr), 0x00);
    }
}

// ========================================
// Pulse 2 Register Tests ($4004-$4007)
// ========================================

#[test]
fn test_write_pulse2_registers() {
    let mut apu = Apu::new();
    apu.write(STATUS, 0x02);

    apu.write(0x4004, 0x80); // Duty=2, no loop, envelope decay
    apu.write(0x4005, 0x10); // Sweep settings
    apu.write(0x4006, 0x55); // Timer low
    apu.write(0x4007, 0x20); // Length counter index=4, timer high=0

    assert_eq!(apu.pulse2.duty, 2);
    assert_eq!(apu.pulse2.timer.period, 0x055);
    assert_eq!(apu.pulse2.length_counter.value(), 40);
    assert!(apu.pulse2.enabled);
}

// ========================================
// Triangle Register Tests ($4008-$400B)
// ========================================

#[test]
fn test_write_triangle_registers() {
    let mut apu = Apu::new();
    apu.write(STATUS, 0x04);

    apu.write(0x4008, 0x81); // Control flag set, reload value = 1
    apu.write(0x4009, 0x00); // Unused
    apu.write(0x400A, 0xDD); // Timer low
    apu.write(0x400B, 0x18); // Length counter index=3, timer high=0

    assert!(apu.triangle.linear_counter.control);
    assert_eq!(apu.triangle.linear_counter.reload, 0x01);
    assert_eq!(apu.triangle.timer.period, 0x0DD);
    assert!(apu.triangle.enabled);
}

// ========================================
// Noise Register Tests ($400C-$400F)
// ========================================

#[test]
fn test_write_noise_registers() {
    let mut apu = Apu::new();
    apu.write(STATUS, 0x08);

    apu.write(0x400C, 0x30); // Envelope loop, constant volume 0
    apu.write(0x400D, 0x00); // Unused
    apu.write(0x400E, 0x87); // Mode 1, period index 7
    apu.write(0x400F, 0x10); // Length counter index=2

    assert!(apu.noise.envelope.loop_flag);
    assert!(apu.noise.envelope.constant_volume);
    assert_eq!(apu.noise.envelope.period, 0);
    assert!(apu.noise.mode);

    // Table entry 7 is in CPU cycles, the timer counts APU cycles
    assert_eq!(apu.noise.timer.period, NOISE_PERIOD_TABLE[7] / 2 - 1);
    assert_eq!(apu.noise.length_counter.value(), 20);
}

// ========================================
// DMC Register Tests ($4010-$4013)
// ========================================

#[test]
fn test_write_dmc_registers() {
    let mut apu = Apu::new();
    apu.write(0x4010, 0xCF);
    apu.write(0x4011, 0x40);
    apu.write(0x4012, 0xC0);
    apu.write(0x4013, 0xFF);

    assert!(apu.dmc.irq_enabled);
    assert!(apu.dmc.loop_flag);
    assert_eq!(apu.dmc_output(), 0x40);
    assert_eq!(apu.dmc.sample_address, 0xF000);
    assert_eq!(apu.dmc.sample_length, 0xFF1);
}

// ========================================
// Control Register Tests ($4015, $4017)
// ========================================

#[test]
fn test_read_status() {
    let mut apu = Apu::new();

    // Initially no channels active
    assert_eq!(apu.read(STATUS), 0x00);

    apu.write(STATUS, 0x01);
    apu.write(PULSE1_CONTROL, 0x30);
    apu.write(PULSE1_LENGTH, 0x08);
    assert_eq!(apu.read(STATUS), 0x01);

    apu.write(STATUS, 0x03);
    apu.write(0x4007, 0x08);
    assert_eq!(apu.read(STATUS), 0x03);

    apu.write(STATUS, 0x0F);
    apu.write(TRIANGLE_LENGTH, 0x08);
    apu.write(NOISE_LENGTH, 0x08);
    assert_eq!(apu.read(STATUS), 0x0F);
}

#[test]
fn test_status_reports_dmc_bytes_remaining() {
    let mut apu = Apu::new();
    apu.write(0x4013, 0x01);
    apu.write(STATUS, 0x10);
    assert_eq!(apu.peek_status() & 0x10, 0x10);

    apu.write(STATUS, 0x00);
    assert_eq!(apu.peek_status() & 0x10, 0x00);
}

#[test]
fn test_status_read_clears_frame_irq_only() {
    let mut apu = Apu::new();
    apu.frame_counter.write_control(0x00);
    run_cycles(&mut apu, 29_830);
    apu.dmc.irq_flag = true;

    let status = apu.read(STATUS);
    assert_eq!(status & 0xC0, 0xC0);

    // Frame IRQ cleared by the read, DMC IRQ untouched
    assert!(!apu.frame_irq_pending());
    assert!(apu.dmc_irq_pending());
    assert_eq!(apu.read(STATUS) & 0xC0, 0x80);
}

#[test]
fn test_status_write_clears_dmc_irq() {
    let mut apu = Apu::new();
    apu.dmc.irq_flag = true;
    assert!(apu.irq_pending());

    apu.write(STATUS, 0x00);
    assert!(!apu.dmc_irq_pending());
}

#[test]
fn test_read_write_only_registers_return_zero() {
    let mut apu = Apu::new();
    for addr in (0x4000..=0x4013).chain([FRAME_COUNTER]) {
        apu.write(addr, 0xFF);
        assert_eq!(apu.read(addr), 0x00);
    }
}

#[test]
fn test_out_of_range_addresses_are_ignored() {
    let mut apu = Apu::new();
    apu.power_on();
    let before = apu.snapshot();

    for addr in [0x0000, 0x2000, 0x3FFF, 0x4014, 0x4016, 0x4018, 0x8000, 0xFFFF] {
        apu.write(addr, 0xFF);
        assert_eq!(apu.read(addr), 0x00);
    }

    let mut reference = Apu::new();
    reference.restore(&before).unwrap();
    run_cycles(&mut apu, 10_000);
    run_cycles(&mut reference, 10_000);
    assert_eq!(apu.peek_status(), reference.peek_status());
    assert_eq!(apu.current_output(), reference.current_output());
}

#[test]
fn test_channel_accessors_agree() {
    let mut apu = Apu::new();
    apu.write(STATUS, 0x01);
    apu.write(PULSE1_CONTROL, 0xBF);
    apu.write(PULSE1_TIMER_LOW, 0xFD);
    apu.write(PULSE1_LENGTH, 0x08);
    run_cycles(&mut apu, 2000);

    assert_eq!(apu.channel_output(Channel::Pulse1), apu.pulse1_output());
    assert_eq!(apu.channel_output(Channel::Pulse2), apu.pulse2_output());
    assert_eq!(apu.channel_output(Channel::Triangle), apu.triangle_output());
    assert_eq!(apu.channel_output(Channel::Noise), apu.noise_output());
    assert_eq!(apu.channel_output(Channel::Dmc), apu.dmc_output());
    assert_eq!(apu.length_counter(Channel::Pulse1), 254);
}

// ========================================
// Clocking Tests
// ========================================

#[test]
fn test_clock_advances_exact_cycles() {
    let mut apu = Apu::new();
    apu.clock(1);
    apu.clock(999);
    assert_eq!(apu.cycles(), 1000);
}

#[test]
fn test_clock_produces_samples_at_sample_rate() {
    let mut apu = Apu::new();
    apu.clock(crate::apu::constants::NTSC_CPU_CLOCK);
    assert_eq!(apu.samples().len(), 44_100);
    assert_eq!(apu.take_samples().len(), 44_100);
    assert!(apu.samples().is_empty());
}

#[test]
fn test_split_clock_calls_match_single_call() {
    let mut whole = Apu::new();
    let mut split = Apu::new();
    for apu in [&mut whole, &mut split] {
        apu.power_on();
        apu.write(PULSE1_CONTROL, 0x9F);
        apu.write(PULSE1_TIMER_LOW, 0x40);
        apu.write(PULSE1_LENGTH, 0x09);
    }

    whole.clock(50_000);
    for chunk in [1u32, 7, 29_829, 3, 20_160] {
        split.clock(chunk);
    }

    assert_eq!(whole.take_samples(), split.take_samples());
}

#[test]
fn test_clock_with_matches_clock() {
    let mut buffered = Apu::new();
    let mut hooked = Apu::new();
    for apu in [&mut buffered, &mut hooked] {
        apu.power_on();
        apu.write(TRIANGLE_CONTROL, 0xFF);
        apu.write(0x400A, 0x80);
        apu.write(TRIANGLE_LENGTH, 0x08);
    }

    buffered.clock(10_000);
    let mut collected = Vec::new();
    hooked.clock_with(10_000, |s| collected.push(s));

    assert_eq!(buffered.take_samples(), collected);
    assert!(hooked.samples().is_empty());
}

#[test]
fn test_step_reports_sample_boundaries() {
    let mut apu = Apu::with_clock_rates(1000, 100);
    let boundaries = (0..1000).filter(|_| apu.step().is_some()).count();
    assert_eq!(boundaries, 100);
}

#[test]
fn test_volume_scales_output() {
    let mut apu = Apu::new();
    apu.write(0x4011, 0x40);
    let full = apu.current_output();

    apu.set_volume(0.5);
    assert!((apu.current_output() * 2.0 - full).abs() < 1e-6);
}

#[test]
fn test_noise_control_write() {
    let mut apu = Apu::new();
    apu.write(NOISE_CONTROL, 0x1F);
    assert_eq!(apu.noise.envelope.volume(), 15);
}
