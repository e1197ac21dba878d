use apnea_risk::assessment::{
    AssessmentError, AssessmentService, Evaluation, IntakeBatch, IntakeField, IntakeRejection,
    RawIntake, RiskClassifier, ThresholdPolicy, DISCLAIMER,
};
use apnea_risk::config::AppConfig;
use apnea_risk::error::AppError;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct AssessArgs {
    /// CSV file with one intake per row; header names the intake fields
    #[arg(
        long,
        conflicts_with_all = [
            "age", "sex", "waist_hip_ratio", "active_smoking", "passive_smoking",
            "alcohol", "physical_activity", "diet_quality", "mental_health",
        ]
    )]
    pub(crate) batch: Option<PathBuf>,
    /// Override the configured model artifact path
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Override the configured threshold policy (wide-middle or even-split)
    #[arg(long)]
    pub(crate) policy: Option<ThresholdPolicy>,
    /// Age in years (30-70)
    #[arg(long)]
    pub(crate) age: Option<String>,
    /// male or female
    #[arg(long)]
    pub(crate) sex: Option<String>,
    /// Waist-to-hip ratio (0.5-1.5)
    #[arg(long)]
    pub(crate) waist_hip_ratio: Option<String>,
    /// yes or no
    #[arg(long)]
    pub(crate) active_smoking: Option<String>,
    /// yes or no
    #[arg(long)]
    pub(crate) passive_smoking: Option<String>,
    /// Drinks per week (0-14)
    #[arg(long)]
    pub(crate) alcohol: Option<String>,
    /// Activity score (0-10)
    #[arg(long)]
    pub(crate) physical_activity: Option<String>,
    /// Diet quality score (0-10)
    #[arg(long)]
    pub(crate) diet_quality: Option<String>,
    /// Stress level (0-20)
    #[arg(long)]
    pub(crate) mental_health: Option<String>,
}

impl AssessArgs {
    fn intake(&mut self) -> RawIntake {
        let values = [
            (IntakeField::Age, self.age.take()),
            (IntakeField::Sex, self.sex.take()),
            (IntakeField::WaistHipRatio, self.waist_hip_ratio.take()),
            (IntakeField::ActiveSmoking, self.active_smoking.take()),
            (IntakeField::PassiveSmoking, self.passive_smoking.take()),
            (IntakeField::Alcohol, self.alcohol.take()),
            (IntakeField::PhysicalActivity, self.physical_activity.take()),
            (IntakeField::DietQuality, self.diet_quality.take()),
            (IntakeField::MentalHealth, self.mental_health.take()),
        ];

        values
            .into_iter()
            .filter_map(|(field, value)| value.map(|value| (field.name().to_string(), value)))
            .collect()
    }
}

pub(crate) fn run_assess(mut args: AssessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let model_path = args.model.take().unwrap_or(config.model.path);
    let policy = args.policy.unwrap_or(config.assessment.policy);

    let classifier = RiskClassifier::from_artifact(&model_path)?;
    let service = AssessmentService::new(classifier, policy);

    println!("Sleep apnea risk assessment");
    println!("Model: {} | policy: {}", model_path.display(), policy);

    match args.batch.take() {
        Some(path) => {
            let rows = IntakeBatch::from_path(&path)?;
            let summary = assess_rows(&service, rows)?;
            println!(
                "\n{} rows | {} assessed | {} rejected",
                summary.total, summary.assessed, summary.rejected
            );
        }
        None => {
            let intake = args.intake();
            match service.evaluate(intake) {
                Ok(evaluation) => render_evaluation(None, &evaluation),
                Err(AssessmentError::Rejected(rejection)) => render_rejection(None, &rejection),
                Err(other) => return Err(other.into()),
            }
        }
    }

    println!("\n{DISCLAIMER}");
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct BatchSummary {
    pub(crate) total: usize,
    pub(crate) assessed: usize,
    pub(crate) rejected: usize,
}

/// Rejected rows are reported and skipped; inference failures abort the batch.
pub(crate) fn assess_rows(
    service: &AssessmentService,
    rows: Vec<RawIntake>,
) -> Result<BatchSummary, AppError> {
    let mut summary = BatchSummary::default();

    for (index, row) in rows.into_iter().enumerate() {
        summary.total += 1;
        let row_number = index + 1;
        match service.evaluate(row) {
            Ok(evaluation) => {
                summary.assessed += 1;
                render_evaluation(Some(row_number), &evaluation);
            }
            Err(AssessmentError::Rejected(rejection)) => {
                summary.rejected += 1;
                render_rejection(Some(row_number), &rejection);
            }
            Err(other) => return Err(other.into()),
        }
    }

    Ok(summary)
}

fn row_prefix(row: Option<usize>) -> String {
    match row {
        Some(number) => format!("Row {number}: "),
        None => String::new(),
    }
}

fn render_evaluation(row: Option<usize>, evaluation: &Evaluation) {
    println!(
        "{}{} (probability {:.3})",
        row_prefix(row),
        evaluation.category.label(),
        evaluation.probability.value()
    );
}

fn render_rejection(row: Option<usize>, rejection: &IntakeRejection) {
    println!(
        "{}rejected [{} on {}]: {}",
        row_prefix(row),
        rejection.error.kind.label(),
        rejection.error.field,
        rejection.error.message
    );
}
