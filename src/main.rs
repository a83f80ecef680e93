use anyhow::Context;
use clap::{Arg, Command};
use lab_analysis::{
    analyzer::LabAnalyzer,
    clock::{RandomIdGenerator, SystemClock},
    example_data::ExampleDataGenerator,
    models::*,
    output::OutputManager,
    reference_data::ReferenceDataLoader,
};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = Command::new("Lab Analysis Tool")
        .version("0.1")
        .about("Interprets laboratory results against demographic-specific reference ranges")
        .arg(
            Arg::new("references")
                .short('r')
                .long("references")
                .value_name("FILE")
                .help("Reference catalog CSV")
                .required_unless_present("generate-example"),
        )
        .arg(
            Arg::new("measurements")
                .short('m')
                .long("measurements")
                .value_name("FILE")
                .help("Measured values CSV")
                .required_unless_present("generate-example"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for results")
                .default_value("./analysis_results"),
        )
        .arg(
            Arg::new("generate-example")
                .long("generate-example")
                .help("Generate an example reference catalog and measurement file")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("NUMBER")
                .help("Seed for example measurement generation")
                .default_value("42"),
        )
        .arg(
            Arg::new("patient-id")
                .long("patient-id")
                .value_name("ID")
                .default_value("PATIENT-1"),
        )
        .arg(
            Arg::new("age")
                .long("age")
                .value_name("YEARS")
                .help("Patient age in years")
                .default_value("45"),
        )
        .arg(
            Arg::new("sex")
                .long("sex")
                .value_name("SEX")
                .help("Patient sex: masculino, femenino, otro")
                .default_value("femenino"),
        )
        .arg(
            Arg::new("ckd-stage")
                .long("ckd-stage")
                .value_name("STAGE")
                .help("CKD stage if present: 1, 2, 3a, 3b, 4, 5"),
        )
        .arg(
            Arg::new("weight")
                .long("weight")
                .value_name("KG")
                .help("Patient weight in kg"),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("CM")
                .help("Patient height in cm"),
        )
        .arg(
            Arg::new("exam-name")
                .long("exam-name")
                .value_name("NAME")
                .default_value("Quimica Sanguinea"),
        )
        .arg(
            Arg::new("mild-threshold")
                .long("mild-threshold")
                .value_name("RATIO")
                .help("Deviation ratio up to which an abnormality is mild")
                .default_value("0.25"),
        )
        .arg(
            Arg::new("moderate-threshold")
                .long("moderate-threshold")
                .value_name("RATIO")
                .help("Deviation ratio up to which an abnormality is moderate")
                .default_value("0.75"),
        )
        .get_matches();

    let output_dir = PathBuf::from(matches.get_one::<String>("output").unwrap());

    let (references_path, measurements_path) = if matches.get_flag("generate-example") {
        std::fs::create_dir_all(&output_dir)?;
        let references = output_dir.join("example_references.csv");
        let measurements = output_dir.join("example_measurements.csv");
        let seed: u64 = matches
            .get_one::<String>("seed")
            .unwrap()
            .parse()
            .context("Invalid seed")?;

        ExampleDataGenerator::generate_reference_catalog(&references)?;
        ExampleDataGenerator::generate_measurements(&measurements, seed)?;
        println!("Generated example files in {}", output_dir.display());

        let references = matches
            .get_one::<String>("references")
            .map(PathBuf::from)
            .unwrap_or(references);
        let measurements = matches
            .get_one::<String>("measurements")
            .map(PathBuf::from)
            .unwrap_or(measurements);
        (references, measurements)
    } else {
        (
            PathBuf::from(matches.get_one::<String>("references").unwrap()),
            PathBuf::from(matches.get_one::<String>("measurements").unwrap()),
        )
    };

    run_analysis(&references_path, &measurements_path, &output_dir, &matches)
}

fn run_analysis(
    references_path: &PathBuf,
    measurements_path: &PathBuf,
    output_dir: &PathBuf,
    matches: &clap::ArgMatches,
) -> anyhow::Result<()> {
    println!("Starting laboratory analysis...");
    println!("References: {}", references_path.display());
    println!("Measurements: {}", measurements_path.display());

    let profile = build_profile(matches)?;
    let config = build_config(matches, output_dir)?;

    let exam_name = matches.get_one::<String>("exam-name").unwrap();
    let examination = ReferenceDataLoader::load_examination(references_path, exam_name)?;
    println!("Loaded {} catalog parameters", examination.parameters().len());

    let measurements = ReferenceDataLoader::load_measurements(measurements_path)?;
    println!("Loaded {} measurements", measurements.len());

    let (analysis, warnings) = LabAnalyzer::analyze_encounter(
        &profile,
        &examination,
        &measurements,
        &config,
        &SystemClock,
        &RandomIdGenerator,
    )?;

    OutputManager::save_results(&analysis, &warnings, output_dir)?;
    print_analysis_summary(&analysis, &warnings);

    Ok(())
}

fn build_profile(matches: &clap::ArgMatches) -> anyhow::Result<PatientProfile> {
    let age: i64 = matches
        .get_one::<String>("age")
        .unwrap()
        .parse()
        .context("Invalid age")?;
    let sex: Sex = matches.get_one::<String>("sex").unwrap().parse()?;

    let mut profile = PatientProfile::new(
        matches.get_one::<String>("patient-id").unwrap().clone(),
        age,
        sex,
    )?;

    if let Some(stage) = matches.get_one::<String>("ckd-stage") {
        profile = profile.with_ckd_stage(stage.parse()?);
    }

    let weight = matches
        .get_one::<String>("weight")
        .map(|w| w.parse::<f64>())
        .transpose()
        .context("Invalid weight")?;
    let height = matches
        .get_one::<String>("height")
        .map(|h| h.parse::<f64>())
        .transpose()
        .context("Invalid height")?;
    Ok(profile.with_body_measurements(weight, height))
}

fn build_config(
    matches: &clap::ArgMatches,
    output_dir: &PathBuf,
) -> anyhow::Result<AnalysisConfig> {
    let mild_max: f64 = matches
        .get_one::<String>("mild-threshold")
        .unwrap()
        .parse()
        .context("Invalid mild threshold")?;
    let moderate_max: f64 = matches
        .get_one::<String>("moderate-threshold")
        .unwrap()
        .parse()
        .context("Invalid moderate threshold")?;

    Ok(AnalysisConfig {
        severity_policy: SeverityPolicy {
            mild_max,
            moderate_max,
        },
        output_path: output_dir.to_string_lossy().to_string(),
    })
}

fn print_analysis_summary(analysis: &AnalysisResult, warnings: &[String]) {
    println!("\n=== ANALYSIS SUMMARY ===");
    println!("Analysis ID: {}", analysis.id);
    println!(
        "Patient: {} ({}, {} years)",
        analysis.patient_profile.id,
        analysis.patient_profile.sex.as_str(),
        analysis.patient_profile.age
    );
    println!("Results: {}", analysis.results().len());

    let abnormal: Vec<_> = analysis
        .results()
        .iter()
        .filter(|r| r.state != ParameterState::Normal)
        .collect();
    if abnormal.is_empty() {
        println!("All values within reference ranges.");
    } else {
        println!("\nAbnormal values:");
        for result in abnormal {
            println!(
                "  {}: {} {} [{}{}]",
                result.parameter_name,
                result.value,
                result.unit,
                result.state.as_str(),
                result
                    .severity
                    .map(|s| format!(", {}", s.as_str()))
                    .unwrap_or_default()
            );
        }
    }

    if !analysis.alerts().is_empty() {
        println!("\nCRITICAL ALERTS: {}", analysis.alerts().len());
        for alert in analysis.alerts() {
            println!("  {} -> {}", alert.message, alert.recommendation);
        }
    }

    if !analysis.calculations().is_empty() {
        println!("\nDerived calculations:");
        for (name, value) in analysis.calculations() {
            println!("  {name}: {value:.2}");
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings: {}", warnings.len());
        println!("  (See analysis_report.txt for details)");
    }

    println!("\nResults saved to output directory.");
}
