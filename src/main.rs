// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::time::Instant;

use anyhow::{Context, Result};
use icarus_dataflow::config::{load_and_validate_config, PipelineConfig};
use icarus_dataflow::engine::{Pipeline, PipelineRuntime, PipelineSender};
use icarus_dataflow::observability::init_tracing;
use icarus_dataflow::records::{Command, MemoryRequest, PositionSample};
use icarus_dataflow::stages::inference::{HIDDEN_BANK, OUTPUT_BANK};

/// Samples streamed through the pipeline by the demo workload.
const DEMO_SAMPLES: u32 = 32;

/// Synthetic weight for entry `(row, col)` of a `rows x cols` layer.
fn demo_weight(row: usize, col: usize, cols: usize) -> f32 {
    0.001 * (row * cols + col) as f32
}

/// Memory requests that fill both inference layers.
fn weight_init_requests(config: &PipelineConfig) -> Vec<MemoryRequest> {
    let input_width = config.stages.encoder.frequencies * 6;
    let hidden = config.stages.inference.hidden;

    let hidden_layer = (0..hidden).flat_map(move |row| {
        (0..input_width).map(move |col| {
            MemoryRequest::inference(HIDDEN_BANK, row, col, demo_weight(row, col, input_width))
        })
    });
    let output_layer = (0..4).flat_map(move |row| {
        (0..hidden).map(move |col| {
            MemoryRequest::inference(OUTPUT_BANK, row, col, demo_weight(row, col, hidden))
        })
    });
    hidden_layer.chain(output_layer).collect()
}

async fn send_workload(handle: PipelineSender, config: PipelineConfig) -> Result<()> {
    let requests = weight_init_requests(&config);
    handle
        .send_command(Command::weight_init(requests.len() as u32))
        .await?;
    for request in requests {
        handle.send_memory_request(request).await?;
    }

    handle.send_command(Command::read_pos(DEMO_SAMPLES)).await?;
    for i in 0..DEMO_SAMPLES {
        let x = i as f32 * 0.1;
        handle
            .send_position(PositionSample::new([x, x, x], i == DEMO_SAMPLES - 1))
            .await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [config.yaml]", args[0]);
        eprintln!("Example: {} configs/pipeline.yaml", args[0]);
        std::process::exit(1);
    }

    let config = match args.get(1) {
        Some(path) => load_and_validate_config(path)
            .with_context(|| format!("failed to load config '{}'", path))?,
        None => PipelineConfig::default(),
    };

    println!("ICARUS dataflow pipeline demo");
    println!("=============================");
    println!(
        "encoder: {} frequencies, latency {} | inference: {} hidden, latency {} | step_size {}",
        config.stages.encoder.frequencies,
        config.stages.encoder.latency,
        config.stages.inference.hidden,
        config.stages.inference.latency,
        config.reshaper.step_size
    );
    println!();

    let start = Instant::now();
    let mut handle = PipelineRuntime::spawn(Pipeline::new(config.clone())?, &config.runtime);

    // The workload is sent from its own task so outputs can be read while
    // it is still streaming in.
    let producer = tokio::spawn(send_workload(handle.sender(), config.clone()));

    let mut received = 0;
    while received < DEMO_SAMPLES {
        let Some(output) = handle.recv_output().await else {
            break;
        };
        println!(
            "sample {:>3}: rgb = [{:.6}, {:.6}, {:.6}]",
            received, output.color[0], output.color[1], output.color[2]
        );
        received += 1;
    }
    producer.await.context("workload task failed")??;

    let stats = handle.shutdown().await?;
    println!();
    println!("Received {} outputs in {:?}", received, start.elapsed());
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
