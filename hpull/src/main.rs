use anyhow::{Context, Result};
use clap::Parser;
use decode::{ByteStreamConfig, DecodeSummary, H264Decoder, ParameterSets, Pps, Sps};
use log::info;

/// Lists the NAL units of an Annex B H.264 stream and prints its parameter sets.
#[derive(Parser, Debug)]
struct Args {
    #[arg(short, long)]
    file_path: String,

    /// Largest NAL unit accepted before the stream is abandoned.
    #[arg(long, default_value_t = ByteStreamConfig::DEFAULT_MAX_UNIT_SIZE)]
    max_unit_size: usize,

    #[arg(long, default_value_t = ByteStreamConfig::DEFAULT_READ_CHUNK_SIZE)]
    read_chunk_size: usize,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

fn describe_sps(sps: &Sps) -> String {
    let mut line = format!(
        "SPS {}: profile {} level {} {}x{} max_frame_num {} poc type {} ref frames {}",
        sps.seq_parameter_set_id,
        sps.profile_idc,
        sps.level_idc,
        sps.width(),
        sps.height(),
        sps.max_frame_num(),
        sps.pic_order_cnt.pic_order_cnt_type(),
        sps.max_num_ref_frames,
    );

    if let Some((time_scale, num_units_in_tick)) = sps.frame_rate() {
        line.push_str(&format!(" fps {time_scale}/{num_units_in_tick}"));
    }

    line
}

fn describe_pps(pps: &Pps, parameter_sets: &ParameterSets) -> String {
    let sps = match parameter_sets.sps_for(pps) {
        Some(_) => format!("SPS {}", pps.seq_parameter_set_id),
        None => format!("missing SPS {}", pps.seq_parameter_set_id),
    };
    let entropy = match pps.entropy_coding_mode_flag {
        true => "CABAC",
        false => "CAVLC",
    };

    format!(
        "PPS {} -> {sps}: {entropy} slice groups {} init qp {}",
        pps.pic_parameter_set_id,
        pps.num_slice_groups_minus1 + 1,
        pps.pic_init_qp(),
    )
}

fn print_text(summary: &DecodeSummary, parameter_sets: &ParameterSets) {
    for (i, unit) in summary.units.iter().enumerate() {
        println!(
            "{i:>6} {:<10} ref_idc {} payload {} bytes",
            unit.nal_unit_type.to_string(),
            unit.nal_ref_idc,
            unit.payload_size
        );
    }

    println!();
    for (nal_unit_type, count) in summary.unit_counts() {
        println!("{:<10} {count}", nal_unit_type.to_string());
    }
    println!("rejected   {}", summary.rejected_units);

    println!();
    for sps in parameter_sets.sps_iter() {
        println!("{}", describe_sps(sps));
    }
    for pps in parameter_sets.pps_iter() {
        println!("{}", describe_pps(pps, parameter_sets));
    }
}

fn print_json(summary: &DecodeSummary, parameter_sets: &ParameterSets) -> Result<()> {
    let report = serde_json::json!({
        "units": summary.units,
        "unit_counts": summary.unit_counts(),
        "rejected_units": summary.rejected_units,
        "sps": parameter_sets.sps_iter().collect::<Vec<_>>(),
        "pps": parameter_sets.pps_iter().collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let Args {
        file_path,
        max_unit_size,
        read_chunk_size,
        json,
    } = Args::parse();

    let config = ByteStreamConfig::new(max_unit_size, read_chunk_size)?;
    let mut decoder = H264Decoder::from_file_path(&file_path)
        .with_context(|| format!("failed to open {file_path}"))?
        .with_config(config);

    let summary = decoder
        .decode()
        .with_context(|| format!("failed to decode {file_path}"))?;
    info!(
        "{file_path}: {} NAL units, {} rejected",
        summary.units.len(),
        summary.rejected_units
    );

    match json {
        true => print_json(&summary, decoder.parameter_sets())?,
        false => print_text(&summary, decoder.parameter_sets()),
    }

    Ok(())
}
