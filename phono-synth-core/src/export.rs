use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use rust_xlsxwriter::{Chart, ChartType, Format, FormatAlign, Workbook};

use crate::error::{SynthError, SynthResult};
use crate::io::ensure_parent;
use crate::synthesis::report::SynthesisReport;

/// Folder used when no report path is given.
pub const DEFAULT_REPORT_DIR: &str = "reports";

/// File format of an exported report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ReportFormat {
	/// Workbook with the run header, both distributions, a chart and the text.
	#[default]
	Xlsx,
	Json,
}

impl ReportFormat {
	pub fn extension(self) -> &'static str {
		match self {
			ReportFormat::Xlsx => "xlsx",
			ReportFormat::Json => "json",
		}
	}
}

impl fmt::Display for ReportFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.extension())
	}
}

impl FromStr for ReportFormat {
	type Err = SynthError;

	fn from_str(s: &str) -> SynthResult<Self> {
		match s.trim().to_lowercase().as_str() {
			"xlsx" => Ok(ReportFormat::Xlsx),
			"json" => Ok(ReportFormat::Json),
			other => Err(SynthError::InvalidParameter(format!("report format must be `xlsx` or `json`, got `{other}`"))),
		}
	}
}

/// `synthesis_by_<mode>_<direction>_by_<criterion>_g<size>_<timestamp>.<ext>`
pub fn default_file_name(report: &SynthesisReport, format: ReportFormat) -> String {
	format!(
		"synthesis_by_{}_{}_by_{}_g{}_{}.{}",
		report.mode,
		report.direction,
		report.criterion,
		report.group_size,
		report.timestamp.format("%Y%m%dT%H%M%S%.3fZ"),
		format.extension()
	)
}

fn target(report: &SynthesisReport, file_name: Option<PathBuf>, format: ReportFormat) -> PathBuf {
	file_name.unwrap_or_else(|| Path::new(DEFAULT_REPORT_DIR).join(default_file_name(report, format)))
}

/// Writes a synthesis report as pretty-printed JSON.
///
/// Map keys come out sorted since every distribution is a `BTreeMap`.
pub struct JsonExport<'a> {
	report: &'a SynthesisReport,
	file_name: PathBuf,
}

impl<'a> JsonExport<'a> {
	/// Targets `file_name`, or the default name inside [`DEFAULT_REPORT_DIR`].
	pub fn new(report: &'a SynthesisReport, file_name: Option<PathBuf>) -> Self {
		Self {
			report,
			file_name: target(report, file_name, ReportFormat::Json),
		}
	}

	/// Targets the default file name inside `dir`.
	pub fn in_dir<P: AsRef<Path>>(report: &'a SynthesisReport, dir: P) -> Self {
		Self {
			report,
			file_name: dir.as_ref().join(default_file_name(report, ReportFormat::Json)),
		}
	}

	pub fn file_name(&self) -> &Path {
		&self.file_name
	}

	/// Writes the report, creating missing parent folders.
	pub fn save(&self) -> SynthResult<PathBuf> {
		ensure_parent(&self.file_name)?;
		let mut writer = BufWriter::new(File::create(&self.file_name)?);
		serde_json::to_writer_pretty(&mut writer, self.report)?;
		writer.flush()?;
		info!("report written to {}", self.file_name.display());
		Ok(self.file_name.clone())
	}
}

/// One line of the distribution table, in percent.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionRow {
	pub group: String,
	pub initial: f64,
	pub result: f64,
}

/// Rows of the distribution table: every initial group in key order, with
/// the result share of groups the result lacks set to zero.
pub fn distribution_rows(report: &SynthesisReport) -> Vec<DistributionRow> {
	report
		.initial_distribution
		.iter()
		.map(|(group, share)| DistributionRow {
			group: group.clone(),
			initial: share * 100.0,
			result: report.result_distribution.get(group).copied().unwrap_or(0.0) * 100.0,
		})
		.collect()
}

const SHEET: &str = "Synthesis";
const TABLE_ROW: u32 = 7;
const ANSWER_HEIGHT: u32 = 15;
/// Cell text limit of the xlsx format.
const MAX_CELL_CHARS: usize = 32_767;

/// Writes a synthesis report as an xlsx workbook.
///
/// Layout of the single sheet:
/// - rows 0 to 5: run header (parameters, word counts, timing, p-value)
/// - from row 7: initial distribution in columns A:B, result in E:F
/// - a column chart of both distributions next to the tables
/// - the synthesized text below the tables
pub struct SpreadsheetExport<'a> {
	report: &'a SynthesisReport,
	file_name: PathBuf,
}

impl<'a> SpreadsheetExport<'a> {
	/// Targets `file_name`, or the default name inside [`DEFAULT_REPORT_DIR`].
	pub fn new(report: &'a SynthesisReport, file_name: Option<PathBuf>) -> Self {
		Self {
			report,
			file_name: target(report, file_name, ReportFormat::Xlsx),
		}
	}

	/// Targets the default file name inside `dir`.
	pub fn in_dir<P: AsRef<Path>>(report: &'a SynthesisReport, dir: P) -> Self {
		Self {
			report,
			file_name: dir.as_ref().join(default_file_name(report, ReportFormat::Xlsx)),
		}
	}

	pub fn file_name(&self) -> &Path {
		&self.file_name
	}

	/// Writes the workbook, creating missing parent folders.
	pub fn save(&self) -> SynthResult<PathBuf> {
		let report = self.report;
		let mut workbook = Workbook::new();
		let worksheet = workbook.add_worksheet();
		worksheet.set_name(SHEET)?;

		worksheet.write_string(0, 0, "Mode:")?;
		worksheet.write_string(0, 1, report.mode.to_string())?;
		worksheet.write_string(0, 3, "Synthesis:")?;
		worksheet.write_string(0, 4, report.direction.to_string())?;

		worksheet.write_string(1, 0, "Criterion:")?;
		worksheet.write_string(1, 1, report.criterion.to_string())?;
		worksheet.write_string(1, 3, "Threshold:")?;
		worksheet.write_number(1, 4, report.threshold)?;
		worksheet.write_string(1, 5, "Result p-value:")?;
		worksheet.write_number(1, 6, report.pvalue)?;

		worksheet.write_string(2, 0, "Initial words:")?;
		worksheet.write_number(2, 1, report.initial_words as f64)?;
		worksheet.write_string(2, 3, "Group size:")?;
		worksheet.write_number(2, 4, f64::from(report.group_size.get()))?;

		worksheet.write_string(3, 0, "Result words:")?;
		worksheet.write_number(3, 1, report.result_words as f64)?;
		worksheet.write_string(3, 3, "Status:")?;
		worksheet.write_string(3, 4, report.status.to_string())?;

		worksheet.write_string(4, 0, "Running time:")?;
		worksheet.write_number(4, 1, report.run_time)?;
		worksheet.write_string(4, 3, "Iterations:")?;
		worksheet.write_number(4, 4, report.iterations as f64)?;

		worksheet.write_string(5, 0, "Date:")?;
		worksheet.write_string(5, 1, report.timestamp.to_rfc3339())?;

		worksheet.write_string(TABLE_ROW, 0, "Initial distribution:")?;
		worksheet.write_string(TABLE_ROW, 4, "Result distribution:")?;
		let rows = distribution_rows(report);
		let mut row = TABLE_ROW + 1;
		for line in &rows {
			worksheet.write_string(row, 0, line.group.as_str())?;
			worksheet.write_number(row, 1, line.initial)?;
			worksheet.write_string(row, 4, line.group.as_str())?;
			worksheet.write_number(row, 5, line.result)?;
			row += 1;
		}

		if !rows.is_empty() {
			let last = row - 1;
			let mut chart = Chart::new(ChartType::Column);
			chart
				.add_series()
				.set_name((SHEET, TABLE_ROW, 0))
				.set_categories((SHEET, TABLE_ROW + 1, 0, last, 0))
				.set_values((SHEET, TABLE_ROW + 1, 1, last, 1));
			chart
				.add_series()
				.set_name((SHEET, TABLE_ROW, 4))
				.set_categories((SHEET, TABLE_ROW + 1, 4, last, 4))
				.set_values((SHEET, TABLE_ROW + 1, 5, last, 5));
			chart.title().set_name("Phoneme distribution");
			chart.x_axis().set_name("Phoneme group");
			chart.y_axis().set_name("Percentage");
			chart.set_style(10);
			chart.set_width(1200);
			chart.set_height(800);
			worksheet.insert_chart_with_offset(TABLE_ROW, 8, &chart, 25, 10)?;
		}

		let answer_row = row + 2;
		let wrapped = Format::new().set_text_wrap().set_align(FormatAlign::Top);
		worksheet.write_string(answer_row, 0, "Answer")?;
		let answer: String = report.text.chars().take(MAX_CELL_CHARS).collect();
		worksheet.merge_range(answer_row + 1, 0, answer_row + ANSWER_HEIGHT, 7, &answer, &wrapped)?;

		ensure_parent(&self.file_name)?;
		workbook.save(&self.file_name)?;
		info!("report written to {}", self.file_name.display());
		Ok(self.file_name.clone())
	}
}
