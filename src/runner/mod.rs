//! Run orchestrator
//!
//! Drives a full export run: connect, export each planned collection in
//! sequence, close the connection, and report a summary. The run moves
//! through `Connecting -> Exporting(<collection>) -> Closing -> Done`,
//! with `Failed` reachable from any step; the first error aborts the
//! remaining steps but never skips the close.

use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::exporter::{
    CollectionExporter, CursorSource, ExportOutcome, FieldRule, FieldRules, JsonArrayWriter,
    ProgressTracker,
};

/// Export plan for one collection: where it goes and how its fields are
/// normalized.
#[derive(Debug, Clone)]
pub struct ExportPlan {
    /// Collection to read
    pub collection: String,

    /// Output file name within the export directory
    pub file_name: String,

    /// Field normalization rules
    pub rules: FieldRules,
}

impl ExportPlan {
    /// Create a plan for one collection.
    pub fn new(collection: &str, rules: FieldRules) -> Self {
        Self {
            collection: collection.to_string(),
            file_name: format!("{collection}.json"),
            rules,
        }
    }

    /// The two collections this tool snapshots, with their rules:
    /// `lessons` keys on `_id`; `orders` additionally carry a list of
    /// lesson references and a creation timestamp.
    pub fn default_plans() -> Vec<ExportPlan> {
        vec![
            ExportPlan::new("lessons", FieldRules::new().rule("_id", FieldRule::Id)),
            ExportPlan::new(
                "orders",
                FieldRules::new()
                    .rule("_id", FieldRule::Id)
                    .rule("lessonIDs", FieldRule::IdList)
                    .rule("createdAt", FieldRule::Timestamp),
            ),
        ]
    }
}

/// Run state information
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Establishing the connection
    Connecting,

    /// Exporting the named collection
    Exporting(String),

    /// Closing the connection
    Closing,

    /// Run finished successfully
    Done,

    /// Run aborted; the message holds the cause
    Failed(String),
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Connecting => write!(f, "connecting"),
            RunState::Exporting(name) => write!(f, "exporting {name}"),
            RunState::Closing => write!(f, "closing"),
            RunState::Done => write!(f, "done"),
            RunState::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Report of a completed run
#[derive(Debug)]
pub struct RunReport {
    /// Outcome per exported collection, in export order
    pub outcomes: Vec<ExportOutcome>,
}

/// Run orchestrator
pub struct Runner {
    config: Config,
    plans: Vec<ExportPlan>,
    quiet: bool,
    state: Arc<RwLock<RunState>>,
}

impl Runner {
    /// Create a runner with the default collection plans.
    ///
    /// # Arguments
    /// * `config` - Run configuration
    /// * `quiet` - Suppress console progress output
    pub fn new(config: Config, quiet: bool) -> Self {
        Self::with_plans(config, ExportPlan::default_plans(), quiet)
    }

    /// Create a runner with explicit plans.
    pub fn with_plans(config: Config, plans: Vec<ExportPlan>, quiet: bool) -> Self {
        Self {
            config,
            plans,
            quiet,
            state: Arc::new(RwLock::new(RunState::Connecting)),
        }
    }

    /// Current run state
    pub async fn state(&self) -> RunState {
        self.state.read().await.clone()
    }

    /// Execute the full run.
    ///
    /// The connection is released on every exit path; the first error
    /// aborts remaining exports and is returned after the close.
    ///
    /// # Returns
    /// * `Result<RunReport>` - Per-collection outcomes or the failure
    pub async fn run(&self) -> Result<RunReport> {
        let mut manager = ConnectionManager::from_config(&self.config)?;

        let result = self.run_phases(&mut manager).await;

        self.transition(RunState::Closing).await;
        manager.disconnect().await;
        self.println("\nMongoDB connection closed");

        match result {
            Ok(report) => {
                self.transition(RunState::Done).await;
                Ok(report)
            }
            Err(e) => {
                error!("Run aborted: {e}");
                self.transition(RunState::Failed(e.to_string())).await;
                Err(e)
            }
        }
    }

    /// Connect and export each planned collection in sequence.
    async fn run_phases(&self, manager: &mut ConnectionManager) -> Result<RunReport> {
        self.transition(RunState::Connecting).await;
        self.println("Connecting to MongoDB...");
        manager.connect().await?;
        self.println("Connected to MongoDB");

        let database = manager.database()?;
        tokio::fs::create_dir_all(&self.config.export.output_dir).await?;

        let mut outcomes = Vec::with_capacity(self.plans.len());
        for plan in &self.plans {
            self.transition(RunState::Exporting(plan.collection.clone()))
                .await;
            self.println(&format!("\nExporting {} collection...", plan.collection));

            let outcome = self.export_collection(&database, plan).await?;
            self.println(&format!(
                "✓ Exported {} {} to {}",
                outcome.documents,
                plan.collection,
                self.config.export.output_dir.join(&plan.file_name).display()
            ));
            outcomes.push(outcome);
        }

        self.println(&format!("\n✅ Export complete!\n\n{}", render_summary(&outcomes)));

        Ok(RunReport { outcomes })
    }

    /// Export one collection per its plan.
    async fn export_collection(
        &self,
        database: &mongodb::Database,
        plan: &ExportPlan,
    ) -> Result<ExportOutcome> {
        let source = CursorSource::open(
            database,
            &plan.collection,
            self.config.export.batch_size,
            self.config.export.stable_order,
        )
        .await?;

        let dest = self.config.export.output_dir.join(&plan.file_name);
        let sink = JsonArrayWriter::create(&dest).await?;
        let tracker = ProgressTracker::new(&plan.collection, !self.quiet);

        CollectionExporter::new(
            &plan.collection,
            Box::new(source),
            plan.rules.clone(),
            Box::new(sink),
            tracker,
        )
        .execute()
        .await
    }

    async fn transition(&self, next: RunState) {
        debug!("Run state: {next}");
        *self.state.write().await = next;
    }

    fn println(&self, line: &str) {
        if !self.quiet {
            println!("{line}");
        }
    }
}

/// Render the verification summary: per-collection counts, then the
/// sample field names of each first record. Empty collections report a
/// zero count and no sample line.
pub fn render_summary(outcomes: &[ExportOutcome]) -> String {
    let mut out = String::from("Verification:");

    for outcome in outcomes {
        out.push_str(&format!(
            "\n- {}: {} documents",
            capitalize(&outcome.collection),
            outcome.documents
        ));
    }

    let mut first_sample = true;
    for outcome in outcomes {
        if let Some(fields) = &outcome.sample_fields {
            if first_sample {
                out.push('\n');
                first_sample = false;
            }
            out.push_str(&format!(
                "\nSample {} fields: {}",
                outcome.collection,
                fields.join(", ")
            ));
        }
    }

    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(collection: &str, documents: u64, fields: Option<Vec<&str>>) -> ExportOutcome {
        ExportOutcome {
            collection: collection.to_string(),
            documents,
            file_size_bytes: 0,
            elapsed_ms: 0,
            sample_fields: fields.map(|f| f.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn test_default_plans_cover_both_collections() {
        let plans = ExportPlan::default_plans();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].collection, "lessons");
        assert_eq!(plans[0].file_name, "lessons.json");
        assert_eq!(plans[1].collection, "orders");
        assert_eq!(plans[1].file_name, "orders.json");
    }

    #[test]
    fn test_summary_with_samples() {
        let outcomes = vec![
            outcome("lessons", 12, Some(vec!["_id", "subject", "spaces"])),
            outcome("orders", 3, Some(vec!["_id", "name", "lessonIDs"])),
        ];
        let summary = render_summary(&outcomes);

        assert_eq!(
            summary,
            "Verification:\n\
             - Lessons: 12 documents\n\
             - Orders: 3 documents\n\
             \n\
             Sample lessons fields: _id, subject, spaces\n\
             Sample orders fields: _id, name, lessonIDs"
        );
    }

    #[test]
    fn test_summary_skips_sample_line_for_empty_collection() {
        let outcomes = vec![
            outcome("lessons", 0, None),
            outcome("orders", 2, Some(vec!["_id", "name"])),
        ];
        let summary = render_summary(&outcomes);

        assert!(summary.contains("- Lessons: 0 documents"));
        assert!(!summary.contains("Sample lessons"));
        assert!(summary.contains("Sample orders fields: _id, name"));
    }

    #[test]
    fn test_summary_all_empty() {
        let outcomes = vec![outcome("lessons", 0, None), outcome("orders", 0, None)];
        let summary = render_summary(&outcomes);

        assert_eq!(
            summary,
            "Verification:\n- Lessons: 0 documents\n- Orders: 0 documents"
        );
    }

    #[tokio::test]
    async fn test_run_without_uri_fails_before_connecting() {
        let runner = Runner::new(Config::default(), true);
        let err = runner.run().await.unwrap_err();
        assert!(err.to_string().contains("connection.uri"));
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_no_output_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.connection.uri = Some("not-a-mongodb-uri".to_string());
        config.export.output_dir = dir.path().join("exports");

        let runner = Runner::new(config, true);
        let result = runner.run().await;

        assert!(result.is_err());
        assert!(matches!(runner.state().await, RunState::Failed(_)));
        // the export directory was never populated
        let created = std::fs::read_dir(dir.path().join("exports"))
            .map(|entries| entries.count())
            .unwrap_or(0);
        assert_eq!(created, 0);
    }

    #[tokio::test]
    async fn test_run_state_starts_connecting() {
        let runner = Runner::new(Config::default(), true);
        assert_eq!(runner.state().await, RunState::Connecting);
    }

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::Exporting("orders".into()).to_string(), "exporting orders");
        assert_eq!(
            RunState::Failed("boom".into()).to_string(),
            "failed: boom"
        );
    }
}
