//! Command output, human-readable or JSON

use std::io::Write;

use serde::Serialize;

use crate::domain::knowledge_base::{
    GenerationResult, IngestionJob, KnowledgeBase, RetrievalPage,
};
use crate::infrastructure::services::{ProvisionedKnowledgeBase, UploadReport};

/// Writes command results to stdout (or any writer in tests)
pub struct OutputWriter<W: Write> {
    out: W,
    json: bool,
}

impl OutputWriter<std::io::Stdout> {
    pub fn stdout(json: bool) -> Self {
        Self::new(std::io::stdout(), json)
    }
}

impl<W: Write> OutputWriter<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self { out, json }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, value)?;
        writeln!(self.out)?;
        Ok(())
    }

    pub fn chunks(&mut self, page: &RetrievalPage) -> anyhow::Result<()> {
        if self.json {
            return self.write_json(page);
        }

        for (i, chunk) in page.chunks.iter().enumerate() {
            writeln!(self.out, "Chunk {}:", i + 1)?;
            writeln!(self.out, "  Content: {}", chunk.content)?;
            if let Some(location) = &chunk.location {
                writeln!(self.out, "  Location: {}", location)?;
            }
            if let Some(score) = chunk.score {
                writeln!(self.out, "  Score: {}", score)?;
            }
            if !chunk.metadata.is_empty() {
                writeln!(
                    self.out,
                    "  Metadata: {}",
                    serde_json::to_string(&chunk.metadata)?
                )?;
            }
            writeln!(self.out)?;
        }

        if let Some(token) = &page.next_token {
            writeln!(self.out, "Next token: {}", token)?;
        }

        Ok(())
    }

    pub fn generation(&mut self, result: &GenerationResult, show_context: bool) -> anyhow::Result<()> {
        if self.json {
            return self.write_json(result);
        }

        writeln!(self.out, "Answer:")?;
        writeln!(self.out, "{}", result.text)?;

        if show_context {
            let context = result.context_texts();
            if !context.is_empty() {
                writeln!(self.out)?;
                writeln!(self.out, "Context:")?;
                for (i, text) in context.iter().enumerate() {
                    writeln!(self.out, "[{}] {}", i + 1, text)?;
                }
            }
        }

        Ok(())
    }

    /// Answer followed by the chunks retrieved for the same query
    pub fn answer_with_chunks(
        &mut self,
        result: &GenerationResult,
        page: &RetrievalPage,
    ) -> anyhow::Result<()> {
        if self.json {
            return self.write_json(&serde_json::json!({
                "generation": result,
                "retrieval": page,
            }));
        }

        self.generation(result, false)?;
        writeln!(self.out)?;
        writeln!(self.out, "Retrieved chunks:")?;
        self.chunks(page)
    }

    pub fn ingestion_jobs(&mut self, jobs: &[IngestionJob]) -> anyhow::Result<()> {
        if self.json {
            return self.write_json(jobs);
        }

        for job in jobs {
            writeln!(
                self.out,
                "Ingestion job {} (data source {}): {}",
                job.id, job.data_source_id, job.status
            )?;

            if let Some(stats) = &job.statistics {
                writeln!(
                    self.out,
                    "  scanned: {}, new: {}, modified: {}, deleted: {}, failed: {}",
                    stats.documents_scanned,
                    stats.new_documents_indexed,
                    stats.modified_documents_indexed,
                    stats.documents_deleted,
                    stats.documents_failed
                )?;
            }

            for reason in &job.failure_reasons {
                writeln!(self.out, "  failure: {}", reason)?;
            }
        }

        Ok(())
    }

    /// Provisioned knowledge base with its ingestion jobs, as a single JSON document in JSON mode
    pub fn provisioned(
        &mut self,
        provisioned: &ProvisionedKnowledgeBase,
        jobs: &[IngestionJob],
    ) -> anyhow::Result<()> {
        if self.json {
            return self.write_json(&serde_json::json!({
                "knowledge_base": provisioned.knowledge_base,
                "data_sources": provisioned.data_sources,
                "ingestion_jobs": jobs,
            }));
        }

        let KnowledgeBase {
            id, name, status, ..
        } = &provisioned.knowledge_base;
        writeln!(self.out, "Knowledge base: {} ({})", id, name)?;
        writeln!(self.out, "Status: {}", status)?;

        for data_source in &provisioned.data_sources {
            writeln!(
                self.out,
                "Data source: {} ({})",
                data_source.id, data_source.name
            )?;
        }

        self.ingestion_jobs(jobs)
    }

    pub fn upload_report(&mut self, report: &UploadReport) -> anyhow::Result<()> {
        if self.json {
            return self.write_json(report);
        }

        for object in &report.objects {
            writeln!(
                self.out,
                "{} -> s3://{}/{}",
                object.path.display(),
                report.bucket,
                object.key
            )?;
        }
        writeln!(
            self.out,
            "Uploaded {} file(s) to {}",
            report.uploaded(),
            report.bucket
        )?;

        Ok(())
    }
}
