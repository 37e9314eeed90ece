use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::Array1;
use ndarray_stats::QuantileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let u = serde_json::from_reader(reader)?;
    Ok(u)
}

pub fn write_csv_rows<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows.iter() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// max_i |a_i - b_i|
pub fn sup_norm_diff(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .fold(0.0_f64, |acc, (x, y)| acc.max((x - y).abs()))
}

pub fn sup_norm(a: &Array1<f64>) -> f64 {
    a.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

/// max(x) - min(x)
pub fn span(x: &Array1<f64>) -> Result<f64> {
    Ok(x.max()? - x.min()?)
}

/// (max(x) + min(x)) / 2
pub fn midrange(x: &Array1<f64>) -> Result<f64> {
    Ok(0.5 * (x.max()? + x.min()?))
}
