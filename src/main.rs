// src/main.rs
//
// Sanity driver: feeds synthetic signals through the capture engine and
// prints how each acquisition cycle ended.

use std::f32::consts::TAU;

use fullscope::{
    ChannelStats, CaptureEngine, DisplayFrame, InputBlock, ModeFlags, ScopeConfig, ScopeParams,
    ViewSettings, create_scope, scope_param_infos,
};

/// ===============================
/// Signal generators
/// ===============================

fn sine_block(freq: f32, sample_rate: f32, phase: &mut f32, out: &mut [f32]) {
    let inc = freq / sample_rate;
    for s in out.iter_mut() {
        *s = 5.0 * (*phase * TAU).sin();
        *phase = (*phase + inc).fract();
    }
}

fn run(
    name: &str,
    engine: &mut CaptureEngine,
    config: &ScopeConfig,
    params: &ScopeParams,
    trigger_connected: bool,
    seconds: f32,
) {
    let block_frames = 256;
    let ctx = config.tick_context();
    let blocks = (seconds * config.sample_rate) as usize / block_frames;

    let mut x = vec![0.0f32; block_frames];
    let mut y = vec![0.0f32; block_frames];
    let mut trig = vec![0.0f32; block_frames];
    let (mut px, mut py, mut pt) = (0.0, 0.25, 0.0);

    let before = engine.stats();
    for _ in 0..blocks {
        sine_block(220.0, config.sample_rate, &mut px, &mut x);
        sine_block(330.0, config.sample_rate, &mut py, &mut y);
        sine_block(55.0, config.sample_rate, &mut pt, &mut trig);

        let block = InputBlock {
            x: &x,
            y: &y,
            trigger: &trig,
            x_connected: true,
            y_connected: true,
            trigger_connected,
        };
        engine.process_block(&ctx, &block, params);
    }
    let after = engine.stats();

    println!(
        "{:<28} cycles {:>5}  free-run {:>5}  triggered {:>5}  timeout {:>5}",
        name,
        after.cycles() - before.cycles(),
        after.free_run - before.free_run,
        after.triggered - before.triggered,
        after.timeouts - before.timeouts,
    );
}

/// ===============================
/// Main
/// ===============================

fn main() {
    let config = ScopeConfig::default();
    let mut params = ScopeParams {
        time: -15.0,
        trigger_level: 1.0,
        ..ScopeParams::default()
    };

    let (display, mut engine) = create_scope(ModeFlags::default());

    println!("Starting capture engine sanity test…");

    for info in scope_param_infos() {
        let value = params.param(info.id).unwrap_or(info.default);
        println!("  [{}] {:<12} {}", info.short_name, info.name, info.format(value));
    }

    run("lissajous (free-run)", &mut engine, &config, &params, false, 1.0);

    display.set_lissajous(false);
    run("internal trigger on X", &mut engine, &config, &params, false, 1.0);

    display.set_external(true);
    run("external, no cable", &mut engine, &config, &params, false, 1.0);
    run("external trigger input", &mut engine, &config, &params, true, 1.0);

    params.trigger_level = 9.0;
    run("external, level unreachable", &mut engine, &config, &params, true, 1.0);

    let snap = display.snapshot();
    let frame = DisplayFrame::compute(&snap, &ViewSettings::from(&params));
    println!("X  {}", ChannelStats::calculate(&snap.x).summary());
    println!("Y  {}", ChannelStats::calculate(&snap.y).summary());
    println!(
        "cursor {} / first plotted point {:?}",
        snap.cursor,
        frame.xy_point(0)
    );

    match display.mode_flags().to_json_string() {
        Ok(json) => println!("saved modes: {}", json.replace(['\n', ' '], "")),
        Err(e) => println!("could not save modes: {}", e),
    }

    println!("Sanity test completed.");
}
