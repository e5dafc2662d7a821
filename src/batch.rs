use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::archiver::{self, ImageFetcher, SaveOutcome};
use crate::converter::LocalToUtcConverter;
use crate::dates;
use crate::error::MoonError;
use crate::fetcher::Transport;
use crate::interrupt::Cancellation;
use crate::locator::ImageLocator;
use crate::models::{BatchOutcome, BatchResult, ImageQuality, ImageRecord, LocalHour, SkippedHour};
use crate::prompt::Console;

pub const DATE_PROMPT: &str =
    "Date of the Moon visualization images (t = today, tm = tomorrow, +N = in N days, YYYY-MM-DD)";
pub const START_PROMPT: &str = "The hour of the first Moon visualization image (00-23)";
pub const END_PROMPT: &str = "The hour of the last Moon visualization image (00-23)";

/// One date and an inclusive, non-decreasing hour range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub date: NaiveDate,
    pub start: LocalHour,
    pub end: LocalHour,
}

impl BatchPlan {
    pub fn image_count(&self) -> u32 {
        self.end.value() - self.start.value() + 1
    }

    fn hours(&self) -> impl Iterator<Item = LocalHour> {
        (self.start.value()..=self.end.value()).filter_map(LocalHour::new)
    }
}

enum Stage {
    CollectingDate,
    CollectingHours(NaiveDate),
    ConfirmingBatch(BatchPlan),
    Downloading(BatchPlan),
    Finished(BatchOutcome),
}

pub struct BatchOrchestrator<'a, T: Transport, C: Console> {
    console: C,
    today: NaiveDate,
    converter: LocalToUtcConverter,
    locator: ImageLocator<'a, T>,
    fetcher: ImageFetcher<'a, T>,
    download_dir: PathBuf,
    quality: ImageQuality,
    confirm: bool,
    cancellation: Cancellation,
}

impl<'a, T: Transport, C: Console> BatchOrchestrator<'a, T, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        console: C,
        today: NaiveDate,
        converter: LocalToUtcConverter,
        locator: ImageLocator<'a, T>,
        fetcher: ImageFetcher<'a, T>,
        download_dir: PathBuf,
        quality: ImageQuality,
        confirm: bool,
        cancellation: Cancellation,
    ) -> Self {
        Self {
            console,
            today,
            converter,
            locator,
            fetcher,
            download_dir,
            quality,
            confirm,
            cancellation,
        }
    }

    #[cfg(test)]
    pub fn console(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn run(&mut self) -> BatchResult {
        let mut result = BatchResult::default();
        let mut stage = Stage::CollectingDate;

        loop {
            stage = match stage {
                Stage::CollectingDate => match self.collect_date() {
                    Ok(date) => Stage::CollectingHours(date),
                    Err(e) => Stage::Finished(BatchOutcome::Aborted(e)),
                },
                Stage::CollectingHours(date) => match self.collect_hours() {
                    Ok((start, end)) => Stage::ConfirmingBatch(BatchPlan { date, start, end }),
                    Err(e) => Stage::Finished(BatchOutcome::Aborted(e)),
                },
                Stage::ConfirmingBatch(plan) => match self.confirm_batch(&plan) {
                    Ok(true) => Stage::Downloading(plan),
                    Ok(false) => Stage::Finished(BatchOutcome::Declined),
                    Err(e) => Stage::Finished(BatchOutcome::Aborted(e)),
                },
                Stage::Downloading(plan) => Stage::Finished(self.download(&plan, &mut result)),
                Stage::Finished(outcome) => {
                    if let BatchOutcome::Aborted(reason) = &outcome {
                        error!(%reason, downloaded = result.downloaded, "batch aborted");
                    }
                    result.outcome = outcome;
                    self.console.say(&result.summary());
                    return result;
                }
            };
        }
    }

    fn read(&mut self, prompt: &str) -> Result<String, MoonError> {
        let line = self.console.input(prompt)?;
        if self.cancellation.is_cancelled() {
            return Err(MoonError::Cancelled);
        }
        Ok(line)
    }

    fn collect_date(&mut self) -> Result<NaiveDate, MoonError> {
        loop {
            let token = self.read(DATE_PROMPT)?;
            match dates::resolve(&token, self.today) {
                Ok(date) => return Ok(date),
                Err(e) if e.is_input_error() => self.console.say(&e.to_string()),
                Err(e) => return Err(e),
            }
        }
    }

    fn collect_hours(&mut self) -> Result<(LocalHour, LocalHour), MoonError> {
        loop {
            match self.read_hour_range()? {
                Ok(range) => return Ok(range),
                Err(e) if e.is_input_error() => self.console.say(&e.to_string()),
                Err(e) => return Err(e),
            }
        }
    }

    /// Outer error ends the batch; inner error means ask again.
    fn read_hour_range(&mut self) -> Result<Result<(LocalHour, LocalHour), MoonError>, MoonError> {
        let start = match self.read(START_PROMPT)?.parse::<LocalHour>() {
            Ok(hour) => hour,
            Err(e) => return Ok(Err(e)),
        };
        let end = match self.read(END_PROMPT)?.parse::<LocalHour>() {
            Ok(hour) => hour,
            Err(e) => return Ok(Err(e)),
        };
        if start > end {
            return Ok(Err(MoonError::HoursOrder {
                start: start.value(),
                end: end.value(),
            }));
        }
        Ok(Ok((start, end)))
    }

    fn confirm_batch(&mut self, plan: &BatchPlan) -> Result<bool, MoonError> {
        if !self.confirm {
            return Ok(true);
        }
        let prompt = format!(
            "{} image(s) of the Moon on {} will be downloaded to {}. Continue?",
            plan.image_count(),
            plan.date.format("%Y-%m-%d"),
            self.download_dir.display()
        );
        let answer = self.console.confirm(&prompt)?;
        if self.cancellation.is_cancelled() {
            return Err(MoonError::Cancelled);
        }
        Ok(answer)
    }

    fn download(&mut self, plan: &BatchPlan, result: &mut BatchResult) -> BatchOutcome {
        info!(date = %plan.date, start = %plan.start, end = %plan.end, "starting batch");

        for hour in plan.hours() {
            if self.cancellation.is_cancelled() {
                return BatchOutcome::Aborted(MoonError::Cancelled);
            }
            let path = archiver::image_path(&self.download_dir, plan.date, hour, self.quality);
            match self.download_hour(plan.date, hour, path.clone()) {
                Ok(SaveOutcome::Saved { .. }) => {
                    result.downloaded += 1;
                    self.console
                        .say(&format!("The image has been saved in {}.", path.display()));
                }
                Ok(SaveOutcome::Empty { status }) => {
                    result.empty += 1;
                    self.console.say(&format!(
                        "The server answered HTTP {status} for hour {hour}; nothing was saved in {}.",
                        path.display()
                    ));
                }
                Err(e) if e.is_skippable() => {
                    warn!(%hour, reason = %e, "skipping hour");
                    self.console.say(&format!("Skipping hour {hour}: {e}"));
                    result.skipped.push(SkippedHour {
                        hour,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return BatchOutcome::Aborted(e),
            }
        }
        BatchOutcome::Completed
    }

    fn download_hour(
        &mut self,
        date: NaiveDate,
        hour: LocalHour,
        path: PathBuf,
    ) -> Result<SaveOutcome, MoonError> {
        let timestamp = self.converter.convert(date, hour)?;
        let frame = self.locator.locate(&timestamp)?;
        let record = ImageRecord {
            url: frame.image_url,
            path,
        };
        let label = format!("{}T{hour}L", date.format("%Y-%m-%d"));
        let console = &mut self.console;
        self.fetcher
            .fetch(&record, &mut |progress| console.progress(&label, progress))
    }
}
