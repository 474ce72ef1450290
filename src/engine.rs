//! Synchronous run entry point.

use chrono::Utc;
use tracing::info;
use ulid::Ulid;

use crate::apply::apply_patches;
use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::extract::{extract_patches, PatchList};
use crate::known::KnownIdentifiers;
use crate::needs::apply_needs;
use crate::progress::Progress;
use crate::summary::RunSummary;

/// A finished run: the patched catalog and what happened to it.
#[derive(Debug)]
pub struct RunOutcome {
    pub catalog: Catalog,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Filter `:NEEDS` and pull the patches out of `catalog`.
    pub fn plan(&self, catalog: &mut Catalog, known: &KnownIdentifiers, progress: &Progress) -> PatchList {
        apply_needs(catalog, known, progress);
        extract_patches(catalog, known, progress)
    }

    /// Run every stage over `catalog` and return the result.
    pub fn run(&self, mut catalog: Catalog, known: &KnownIdentifiers, progress: &Progress) -> RunOutcome {
        let run_id = Ulid::new().to_string();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            files = catalog.file_count(),
            documents = catalog.document_count(),
            known = known.len(),
            "starting patch run"
        );

        let list = self.plan(&mut catalog, known, progress);
        apply_patches(
            &mut catalog,
            &list,
            self.config.max_patch_loop_iterations,
            progress,
        );

        let counters = progress.counters();
        let summary = RunSummary::new(
            run_id,
            started_at,
            counters.snapshot(),
            counters.errors_by_file(),
            list.report(),
            catalog.document_count(),
        );
        info!(run_id = %summary.run_id, duration_ms = summary.duration_ms, "{}", progress.status_line());

        RunOutcome { catalog, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullSink;
    use crate::summary::Status;
    use confpatch_tree::parse_document;

    #[test]
    fn test_run_summarises() {
        let catalog = Catalog::new().with_file(
            "a.cfg",
            "",
            parse_document(
                "PART { name = p\n mass = 1 }
                @PART:NEEDS[Missing] { @mass = 9 }
                @PART:FIRST { @mass *= 2 }
                @PART:FOR[Foo] { @mass += 1 }",
            )
            .unwrap(),
        );
        let known: KnownIdentifiers = ["Foo"].into_iter().collect();
        let progress = Progress::with_sink(NullSink);
        let outcome = Engine::default().run(catalog, &known, &progress);

        let doc = outcome.catalog.documents().next().unwrap().1;
        assert_eq!(doc.value("mass"), Some("3"));
        assert_eq!(outcome.summary.status, Status::Success);
        assert_eq!(outcome.summary.documents, 1);
        assert_eq!(outcome.summary.counters.patches_applied, 2);
        assert_eq!(outcome.summary.counters.needs_unsatisfied, 1);
        let passes: Vec<_> = outcome.summary.passes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(passes, vec![":FIRST", ":FOR[Foo]"]);
        assert_eq!(outcome.summary.run_id.len(), 26);
    }

    #[test]
    fn test_plan_is_dry() {
        let mut catalog = Catalog::new().with_file(
            "a.cfg",
            "",
            parse_document("PART { name = p }\n@PART:FINAL { @name = q }").unwrap(),
        );
        let progress = Progress::with_sink(NullSink);
        let list = Engine::default().plan(&mut catalog, &KnownIdentifiers::new(), &progress);
        assert_eq!(list.patch_count(), 1);
        assert_eq!(catalog.document_count(), 1);
        assert_eq!(catalog.documents().next().unwrap().1.value("name"), Some("p"));
    }
}
