use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rust_xlsxwriter::{Format, Workbook};

use project_dashboard::config::DEFAULT_DATA_PATH;
use project_dashboard::data::loader::DEFAULT_SHEET;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }
}

/// One generated project row.
struct Row {
    project_type: &'static str,
    status: &'static str,
    total_projects: i64,
    budget_allocated: f64,
    budget_utilized: f64,
    satisfaction: f64,
    year: i64,
    utilization: f64,
}

const HEADERS: [&str; 8] = [
    "Project Type",
    "Status",
    "Total Projects",
    "Budget Allocated",
    "Budget Utilized",
    "Citizen Satisfaction Rate",
    "Year",
    "Budget Utilization Percentage",
];

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let types = ["Road", "Water Supply", "Health", "Education", "Housing"];
    let statuses = ["Completed", "Ongoing", "Delayed", "Planned"];

    let mut rows = Vec::new();
    for year in 2018..=2023 {
        for _ in 0..12 {
            let status = rng.pick(&statuses);
            let budget_allocated = (rng.range(1.0e5, 5.0e6) / 1000.0).round() * 1000.0;
            let utilization = match status {
                "Planned" => rng.range(0.0, 0.1),
                "Completed" => rng.range(0.85, 1.0),
                _ => rng.range(0.3, 0.9),
            };
            let budget_utilized = (budget_allocated * utilization).round();
            rows.push(Row {
                project_type: rng.pick(&types),
                status,
                total_projects: 1 + (rng.next_u64() % 20) as i64,
                budget_allocated,
                budget_utilized,
                satisfaction: (rng.range(0.4, 0.95) * 100.0).round() / 100.0,
                year,
                utilization: budget_utilized / budget_allocated,
            });
        }
    }
    rows
}

fn write_xlsx(rows: &[Row], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let ws = workbook.add_worksheet();
    ws.set_name(DEFAULT_SHEET)?;

    for (c, h) in HEADERS.iter().enumerate() {
        ws.write_string_with_format(0, c as u16, *h, &bold)?;
    }
    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        ws.write_string(row, 0, r.project_type)?;
        ws.write_string(row, 1, r.status)?;
        ws.write_number(row, 2, r.total_projects as f64)?;
        ws.write_number(row, 3, r.budget_allocated)?;
        ws.write_number(row, 4, r.budget_utilized)?;
        ws.write_number(row, 5, r.satisfaction)?;
        ws.write_number(row, 6, r.year as f64)?;
        ws.write_number(row, 7, r.utilization)?;
    }

    workbook.save(path).context("saving workbook")?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new(HEADERS[0], DataType::Utf8, false),
        Field::new(HEADERS[1], DataType::Utf8, false),
        Field::new(HEADERS[2], DataType::Int64, false),
        Field::new(HEADERS[3], DataType::Float64, false),
        Field::new(HEADERS[4], DataType::Float64, false),
        Field::new(HEADERS[5], DataType::Float64, false),
        Field::new(HEADERS[6], DataType::Int64, false),
        Field::new(HEADERS[7], DataType::Float64, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.project_type))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.status))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.total_projects))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.budget_allocated))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.budget_utilized))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.satisfaction))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.year))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.utilization))),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    let xlsx_path = Path::new(DEFAULT_DATA_PATH);
    write_xlsx(&rows, xlsx_path)?;
    let parquet_path = xlsx_path.with_extension("parquet");
    write_parquet(&rows, &parquet_path)?;

    log::info!("Generated {} rows", rows.len());
    println!(
        "Wrote {} projects to {} (sheet '{DEFAULT_SHEET}') and {}",
        rows.len(),
        xlsx_path.display(),
        parquet_path.display()
    );
    Ok(())
}
