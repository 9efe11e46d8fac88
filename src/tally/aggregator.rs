use crate::error::PartTallyError;
use crate::grid::Document;
use crate::grid::SheetGrid;
use crate::source::DocumentSource;
use crate::tally::extractor::extract;
use crate::tally::locator::locate;
use crate::tally::locator::MatchMode;
use crate::tally::segmenter::group_by_column;
use crate::tally::segmenter::segment;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fmt::Display;
use std::num::NonZeroUsize;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Header label used when none is configured.
pub const DEFAULT_LABEL: &str = "part number";

/// Per-run options, passed explicitly to the aggregator.
#[derive(Clone, Debug, PartialEq)]
pub struct TallyOptions {
    /// Header label to search for
    pub label: String,
    /// Header matching mode
    pub mode: MatchMode,
    /// Upper bound on concurrently processed documents
    pub workers: usize,
}

impl Default for TallyOptions {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_owned(),
            mode: MatchMode::default(),
            workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

impl TallyOptions {
    pub fn with_label(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            ..Self::default()
        }
    }
}

/// A document the source could not supply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentUnavailable {
    pub document: String,
    pub reason: String,
}

impl DocumentUnavailable {
    pub fn new(document: &str, reason: impl Display) -> Self {
        Self {
            document: document.to_owned(),
            reason: reason.to_string(),
        }
    }
}

impl Display for DocumentUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.document, self.reason)
    }
}

/// Result of a batch: the deduplicated values and the documents that failed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tally {
    pub values: BTreeSet<String>,
    pub failures: Vec<DocumentUnavailable>,
}

impl Tally {
    /// Number of distinct values.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Folds one complete document outcome into the running result.
    fn merge(&mut self, outcome: Result<BTreeSet<String>, DocumentUnavailable>) {
        match outcome {
            Ok(values) => self.values.extend(values),
            Err(failure) => {
                warn!(document = %failure.document, reason = %failure.reason, "document excluded");
                self.failures.push(failure);
            }
        }
    }
}

/// Runs locate → group → segment → extract over sheets and documents and
/// merges the results into one set.
#[derive(Clone, Debug, Default)]
pub struct Aggregator {
    options: TallyOptions,
}

impl Aggregator {
    pub fn new(options: TallyOptions) -> Self {
        Self { options }
    }

    /// Values found under every header occurrence in one sheet.
    pub fn extract_sheet(&self, sheet: &SheetGrid) -> BTreeSet<String> {
        let occurrences = locate(sheet, &self.options.label, self.options.mode);
        let mut values = BTreeSet::new();
        for column in group_by_column(&occurrences) {
            for region in segment(sheet, &column) {
                let found = extract(sheet, &region);
                debug!(region = %region, rows = region.len(), values = found.len(), "region extracted");
                values.extend(found);
            }
        }
        debug!(
            sheet = sheet.name(),
            max_row = sheet.max_row(),
            max_col = ?sheet.max_col(),
            headers = occurrences.len(),
            values = values.len(),
            "sheet processed"
        );
        values
    }

    /// Union of all sheets of a document.
    pub fn extract_document(&self, document: &Document) -> BTreeSet<String> {
        document
            .sheets
            .iter()
            .flat_map(|sheet| self.extract_sheet(sheet))
            .collect()
    }

    /// Folds already-loaded documents in order. Unavailable documents are
    /// reported in the tally and do not affect the others.
    pub fn run<I>(&self, documents: I) -> Tally
    where
        I: IntoIterator<Item = Result<Document, DocumentUnavailable>>,
    {
        info!(label = %self.options.label, mode = %self.options.mode, "tally started");
        let mut tally = Tally::default();
        for document in documents {
            tally.merge(document.map(|document| self.extract_document(&document)));
        }
        info!(count = tally.count(), failures = tally.failures.len(), "tally finished");
        tally
    }

    /// Loads and extracts each source on a bounded worker pool, one worker
    /// per document, then merges the complete per-document sets.
    ///
    /// # Errors
    ///
    /// Returns an error only if the worker pool cannot be created; document
    /// failures are reported in the tally.
    pub fn run_sources<S>(&self, sources: &[S]) -> Result<Tally, PartTallyError>
    where
        S: DocumentSource + Sync,
    {
        info!(
            label = %self.options.label,
            mode = %self.options.mode,
            documents = sources.len(),
            workers = self.options.workers,
            "tally started"
        );
        // 0 would mean rayon's default pool size
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.workers.max(1))
            .build()?;
        let outcomes: Vec<Result<BTreeSet<String>, DocumentUnavailable>> = pool.install(|| {
            sources
                .par_iter()
                .map(|source| self.process_source(source))
                .collect()
        });

        let mut tally = Tally::default();
        for outcome in outcomes {
            tally.merge(outcome);
        }
        info!(count = tally.count(), failures = tally.failures.len(), "tally finished");
        Ok(tally)
    }

    fn process_source<S: DocumentSource>(&self, source: &S) -> Result<BTreeSet<String>, DocumentUnavailable> {
        let name = source.name();
        debug!(document = %name, "processing");
        source
            .load()
            .map(|document| self.extract_document(&document))
            .map_err(|error| DocumentUnavailable::new(&name, error))
    }
}

/// Counts distinct values under `label` across documents with default options.
pub fn run<I>(documents: I, label: &str) -> Tally
where
    I: IntoIterator<Item = Result<Document, DocumentUnavailable>>,
{
    Aggregator::new(TallyOptions::with_label(label)).run(documents)
}
