use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::prelude::*;

use crate::apriori::{Apriori, MinerConfig, SupportStrategy};
use crate::common::{flatten_levels, flatten_rules};
use crate::database::TransactionDatabase;
use crate::error::Result;

type PyMined<'py> = (
    Bound<'py, PyArray1<u64>>,
    Bound<'py, PyArray1<u32>>,
    Bound<'py, PyArray1<u32>>,
    Bound<'py, PyArray1<u32>>,
    Bound<'py, PyArray1<u32>>,
    Bound<'py, PyArray1<u32>>,
    Bound<'py, PyArray1<u32>>,
    Bound<'py, PyArray1<f64>>,
);

fn mine_and_flatten<'py>(
    py: Python<'py>,
    db: TransactionDatabase<u32>,
    min_count: u64,
    min_confidence: f64,
    strategy: SupportStrategy,
    max_len: Option<usize>,
) -> PyResult<PyMined<'py>> {
    let config = MinerConfig::default().with_strategy(strategy).with_max_len(max_len);
    let out = py.allow_threads(|| -> Result<_> {
        let apriori = Apriori::with_config(&db, config);
        apriori.run::<u32>(min_count, min_confidence)
    })?;

    let (supports, offsets, items) = flatten_levels(&out.levels);
    let (ant_offsets, ant_items, con_offsets, con_items, confidences) = flatten_rules(&out.rules);
    Ok((
        supports.into_pyarray(py),
        offsets.into_pyarray(py),
        items.into_pyarray(py),
        ant_offsets.into_pyarray(py),
        ant_items.into_pyarray(py),
        con_offsets.into_pyarray(py),
        con_items.into_pyarray(py),
        confidences.into_pyarray(py),
    ))
}

#[pyfunction]
#[pyo3(signature = (data, min_count, min_confidence, strategy="partial_then_refine", max_len=None))]
pub fn apriori_from_dense<'py>(
    py: Python<'py>,
    data: PyReadonlyArray2<u8>,
    min_count: u64,
    min_confidence: f64,
    strategy: &str,
    max_len: Option<usize>,
) -> PyResult<PyMined<'py>> {
    let strategy: SupportStrategy = strategy.parse()?;
    let arr = data.as_array();
    let (n_rows, n_cols) = arr.dim();
    let flat: &[u8] = arr
        .as_slice()
        .ok_or_else(|| pyo3::exceptions::PyValueError::new_err("data must be C-contiguous"))?;
    let db = TransactionDatabase::from_dense(flat, n_rows, n_cols)?;
    mine_and_flatten(py, db, min_count, min_confidence, strategy, max_len)
}

#[pyfunction]
#[pyo3(signature = (indptr, indices, min_count, min_confidence, strategy="partial_then_refine", max_len=None))]
pub fn apriori_from_csr<'py>(
    py: Python<'py>,
    indptr: PyReadonlyArray1<i32>,
    indices: PyReadonlyArray1<i32>,
    min_count: u64,
    min_confidence: f64,
    strategy: &str,
    max_len: Option<usize>,
) -> PyResult<PyMined<'py>> {
    let strategy: SupportStrategy = strategy.parse()?;
    let db = TransactionDatabase::from_csr(indptr.as_slice()?, indices.as_slice()?)?;
    mine_and_flatten(py, db, min_count, min_confidence, strategy, max_len)
}

#[pymodule]
fn _apriori(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(apriori_from_dense, m)?)?;
    m.add_function(wrap_pyfunction!(apriori_from_csr, m)?)?;
    Ok(())
}
