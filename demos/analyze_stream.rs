//! Runs the analyzer over a synthetic beat pattern and prints every event.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example analyze_stream
//! ```

use rustfft::{num_complex::Complex, FftPlanner};

use pulse_dsp::{AnalysisError, SpectrumAnalyzer, SpectrumFrame};

const FFT_SIZE: usize = 1024;
const SAMPLE_RATE: u32 = 44100;
const TICK: f32 = 1.0 / 30.0;
const DURATION_SECONDS: f32 = 20.0;

fn main() -> Result<(), AnalysisError> {
    env_logger::init();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FFT_SIZE);
    let mut analyzer = SpectrumAnalyzer::new(SAMPLE_RATE)?;

    println!("Analyzing {DURATION_SECONDS}s of a synthetic 125 BPM pattern...\n");

    let ticks = (DURATION_SECONDS / TICK) as usize;
    for tick in 0..ticks {
        let now = tick as f32 * TICK;

        // 125 BPM four-on-the-floor with off-beat hats and a mid build
        let beat_phase = now % 0.48;
        let kick = beat_phase < 0.06;
        let hat = (now + 0.24) % 0.48 < 0.04;
        let build = (8.0..12.0).contains(&now);
        let build_level = if build { (now - 8.0) / 4.0 } else { 0.0 };

        let mut buffer: Vec<Complex<f32>> = (0..FFT_SIZE)
            .map(|n| {
                let t = now + n as f32 / SAMPLE_RATE as f32;
                let mut sample = 0.25 * (2.0 * std::f32::consts::PI * 3000.0 * t).sin();
                if kick {
                    sample += (2.0 * std::f32::consts::PI * 50.0 * t).sin();
                }
                if hat {
                    sample += 0.5 * (2.0 * std::f32::consts::PI * 6500.0 * t).sin();
                }
                sample += build_level * 0.6 * (2.0 * std::f32::consts::PI * 10000.0 * t).sin();
                Complex::new(sample, 0.0)
            })
            .collect();
        fft.process(&mut buffer);

        let bins: Vec<f32> = buffer
            .iter()
            .take(FFT_SIZE / 2)
            .map(|c| c.norm() / FFT_SIZE as f32)
            .collect();

        analyzer.push_frame(SpectrumFrame {
            bins: &bins,
            fft_size: FFT_SIZE,
            sample_rate: SAMPLE_RATE,
            now_seconds: now,
        })?;

        for event in analyzer.poll_events() {
            println!("{now:7.3}s  {:<10} intensity {:.2}", event.kind(), event.intensity());
        }
    }

    println!("\n--- session summary ---");
    match analyzer.estimated_bpm() {
        Some(bpm) => println!("estimated tempo : {bpm:.1} BPM"),
        None => println!("estimated tempo : (not enough kicks)"),
    }
    let groove = analyzer.groove_state();
    if let Some(pattern) = groove.pattern {
        println!(
            "groove          : {} ({:.1} BPM, confidence {:.2})",
            pattern.as_str(),
            groove.bpm,
            groove.confidence
        );
    } else {
        println!("groove          : none");
    }
    println!("vocal presence  : {:.2}", analyzer.vocal_presence());
    println!("visual intensity: {:.2}", analyzer.visual_intensity());

    Ok(())
}
