//! Computation driver

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::{
    round2, AcError, AttrValue, AttributeCalculator, DecodedRecord, ProgressSink, Result,
    TypeCheck, DEFAULT_PROGRESS_EVERY,
};

/// Record id -> validated value. Ordered, so serialization is stable.
pub type CalculatedAttributes = BTreeMap<String, AttrValue>;

pub struct ComputationDriver<'c> {
    calculator: &'c mut dyn AttributeCalculator,
    check: TypeCheck,
    progress_every: usize,
}

impl<'c> ComputationDriver<'c> {
    pub fn new(calculator: &'c mut dyn AttributeCalculator, check: TypeCheck) -> Self {
        Self {
            calculator,
            check,
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }

    /// Values below 1 are clamped to 1.
    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every.max(1);
        self
    }

    pub fn check(&self) -> TypeCheck {
        self.check
    }

    /// Run the calculator over `records` in order. Any calculator failure,
    /// type mismatch or structural violation aborts the run and no partial
    /// map is returned.
    ///
    /// Progress: 0.0 up front, the completed fraction after every
    /// `progress_every` records (except the last one), then 1.0.
    pub fn run(
        &mut self,
        records: Vec<DecodedRecord>,
        progress: &mut dyn ProgressSink,
    ) -> Result<CalculatedAttributes> {
        let total = records.len();
        let mut results = CalculatedAttributes::new();

        progress.emit(0.0);
        for (i, record) in records.into_iter().enumerate() {
            let value = self.calculator.calculate(&record.data).map_err(|e| {
                AcError::Calculation {
                    record_id: record.id.clone(),
                    message: format!("{e:#}"),
                }
            })?;

            match self.check.check(&value) {
                Ok(true) => {}
                Ok(false) => return Err(self.check.mismatch(&record.id, &value)),
                Err(AcError::StructuralViolation(msg)) => {
                    return Err(AcError::StructuralViolation(format!("record {}: {msg}", record.id)))
                }
                Err(e) => return Err(e),
            }

            if results.insert(record.id.clone(), value).is_some() {
                warn!(record_id = %record.id, "duplicate record id, keeping the later value");
            }

            let done = i + 1;
            if done % self.progress_every == 0 && done < total {
                let fraction = round2(done as f64 / total as f64);
                debug!(done, total, fraction, "progress");
                progress.emit(fraction);
            }
        }
        progress.emit(1.0);

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataType, Field, LineProgress, RecordData};
    use serde_json::json;

    fn records(n: usize) -> Vec<DecodedRecord> {
        (0..n)
            .map(|i| {
                let mut data = RecordData::default();
                data.insert("n", Field::Scalar(json!(i)));
                DecodedRecord { id: format!("r{i:04}"), data }
            })
            .collect()
    }

    fn n_of(data: &RecordData) -> i64 {
        data.scalar("n").and_then(|v| v.as_i64()).unwrap_or(-1)
    }

    #[test]
    fn test_progress_for_250_records() {
        let mut calc = |d: &RecordData| -> anyhow::Result<AttrValue> { Ok(n_of(d).into()) };
        let mut seen: Vec<f64> = Vec::new();

        ComputationDriver::new(&mut calc, TypeCheck::new(DataType::Integer))
            .run(records(250), &mut seen)
            .unwrap();
        assert_eq!(seen, vec![0.0, 0.4, 0.8, 1.0]);
    }

    #[test]
    fn test_progress_lines_for_250_records() {
        let mut calc = |d: &RecordData| -> anyhow::Result<AttrValue> { Ok(n_of(d).into()) };
        let mut sink = LineProgress::new(Vec::new());

        ComputationDriver::new(&mut calc, TypeCheck::new(DataType::Integer))
            .run(records(250), &mut sink)
            .unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            ["progress: 0.00", "progress: 0.40", "progress: 0.80", "progress: 1.00"]
        );
    }

    #[test]
    fn test_progress_small_and_exact_batches() {
        let cases: [(usize, Vec<f64>); 4] = [
            (0, vec![0.0, 1.0]),
            (3, vec![0.0, 1.0]),
            (100, vec![0.0, 1.0]),
            (300, vec![0.0, 0.33, 0.67, 1.0]),
        ];
        for (n, expected) in cases {
            let mut calc = |d: &RecordData| -> anyhow::Result<AttrValue> { Ok(n_of(d).into()) };
            let mut seen: Vec<f64> = Vec::new();
            ComputationDriver::new(&mut calc, TypeCheck::new(DataType::Integer))
                .run(records(n), &mut seen)
                .unwrap();
            assert_eq!(seen, expected, "batch of {n}");
        }
    }

    #[test]
    fn test_custom_interval() {
        let mut calc = |d: &RecordData| -> anyhow::Result<AttrValue> { Ok(n_of(d).into()) };
        let mut seen: Vec<f64> = Vec::new();
        ComputationDriver::new(&mut calc, TypeCheck::new(DataType::Integer))
            .with_progress_every(2)
            .run(records(5), &mut seen)
            .unwrap();
        assert_eq!(seen, vec![0.0, 0.4, 0.8, 1.0]);
    }

    #[test]
    fn test_calculator_called_once_per_record() {
        let mut calls = 0usize;
        let mut calc = |d: &RecordData| -> anyhow::Result<AttrValue> {
            calls += 1;
            Ok(AttrValue::Float(n_of(d) as f64 / 2.0))
        };
        let out = ComputationDriver::new(&mut calc, TypeCheck::new(DataType::Float))
            .run(records(7), &mut Vec::<f64>::new())
            .unwrap();

        assert_eq!(calls, 7);
        assert_eq!(out.len(), 7);
        assert_eq!(out["r0003"], AttrValue::Float(1.5));
    }

    #[test]
    fn test_mismatch_aborts_run() {
        let mut calc = |d: &RecordData| -> anyhow::Result<AttrValue> {
            Ok(if n_of(d) == 2 { AttrValue::Int(1) } else { AttrValue::Bool(true) })
        };
        let err = ComputationDriver::new(&mut calc, TypeCheck::new(DataType::Boolean))
            .run(records(5), &mut Vec::<f64>::new())
            .unwrap_err();

        match err {
            AcError::Validation { record_id, kind, data_type, .. } => {
                assert_eq!(record_id, "r0002");
                assert_eq!(kind, crate::ValueKind::Int);
                assert_eq!(data_type, DataType::Boolean);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_category_is_structural() {
        let mut calc = |_: &RecordData| -> anyhow::Result<AttrValue> { Ok("".into()) };
        let err = ComputationDriver::new(&mut calc, TypeCheck::new(DataType::Category))
            .run(records(1), &mut Vec::<f64>::new())
            .unwrap_err();
        assert!(matches!(err, AcError::StructuralViolation(ref m) if m.contains("r0000")), "{err}");
    }

    #[test]
    fn test_calculator_failure_propagates() {
        let mut calc = |d: &RecordData| -> anyhow::Result<AttrValue> {
            if n_of(d) == 1 {
                anyhow::bail!("plugin blew up");
            }
            Ok("ok".into())
        };
        let mut seen: Vec<f64> = Vec::new();
        let err = ComputationDriver::new(&mut calc, TypeCheck::new(DataType::Text))
            .run(records(3), &mut seen)
            .unwrap_err();

        assert!(matches!(err, AcError::Calculation { ref record_id, ref message }
            if record_id == "r0001" && message.contains("plugin blew up")));
        assert_eq!(seen, vec![0.0]);
    }
}
