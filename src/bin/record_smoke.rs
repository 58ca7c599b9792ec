use anyhow::Context;
use clap::Parser;
use fastcomp::bench::{ImmediateTaskRunner, RecordBenchmark};
use fastcomp::fixture::FixturePaintClient;
use fastcomp::{ContentLayer, HostSettings, LayerTree, Size};
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;

#[derive(Parser)]
#[command(about = "Offline recording benchmark over a synthetic layer scene")]
struct Args {
  /// Number of content layers in the scene
  #[arg(long, default_value_t = 4)]
  layers: usize,

  /// Side length of each (square) layer, in pixels
  #[arg(long, default_value_t = 256)]
  layer_size: i32,

  /// Grid cells per side within each layer
  #[arg(long, default_value_t = 8)]
  grid: usize,

  /// Outer repetitions per layer per recording mode
  #[arg(long, default_value_t = 100)]
  repeat: usize,

  /// Wrap each row of cells in a transform pair
  #[arg(long)]
  transform_pairs: bool,

  /// Write the JSON report to this path (always printed to stdout)
  #[arg(long)]
  output: Option<PathBuf>,
}

fn build_scene(args: &Args) -> LayerTree {
  let mut tree = LayerTree::new(HostSettings {
    device_viewport_size: Size::new(1920, 1080),
    ..HostSettings::default()
  });
  for _ in 0..args.layers {
    let client = FixturePaintClient::new(args.layer_size, args.layer_size)
      .with_grid(args.grid, args.grid)
      .with_transform_pairs(args.transform_pairs);
    let mut layer = ContentLayer::with_client(Box::new(client));
    layer.set_bounds(Size::new(args.layer_size, args.layer_size));
    tree.add_layer(layer);
  }
  // Warm the picture caches the way a live scene would be warm.
  tree.update_all();
  tree
}

fn main() -> anyhow::Result<()> {
  let args = Args::parse();
  let mut tree = build_scene(&args);

  let (sender, receiver) = mpsc::channel();
  let benchmark = RecordBenchmark::with_repeat_count(
    args.repeat.max(1),
    Box::new(move |report| {
      let _ = sender.send(report);
    }),
  );
  benchmark.run(&mut tree, &ImmediateTaskRunner, None);
  let report = receiver
    .recv()
    .context("benchmark completed without a report")?;

  let json = serde_json::to_string_pretty(&report).context("serialize report")?;
  println!("{json}");
  if let Some(path) = &args.output {
    fs::write(path, &json).with_context(|| format!("write {}", path.display()))?;
  }
  Ok(())
}
