use anyhow::Result;
use std::{io::Write, sync::Arc};

use crate::{
    codec::INT_MISSING,
    load::RowReader,
    table::{CompoundKey, Entity, TableSpec},
    write::RowWriter,
};

#[derive(Debug, Clone)]
pub struct ShapePoint {
    pub source_row: u64,
    pub shape_id: Option<Arc<str>>,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: i32,
    pub shape_dist_traveled: f64,
}

impl Entity for ShapePoint {
    type Key = CompoundKey;

    fn source_row(&self) -> u64 {
        self.source_row
    }

    fn key(&self) -> Option<CompoundKey> {
        let shape_id = self.shape_id.clone()?;
        (self.shape_pt_sequence != INT_MISSING)
            .then(|| CompoundKey::new(shape_id, self.shape_pt_sequence))
    }

    fn sequence_number(&self) -> Option<i32> {
        (self.shape_pt_sequence != INT_MISSING).then_some(self.shape_pt_sequence)
    }
}

pub struct ShapeTable;

impl TableSpec for ShapeTable {
    type Entity = ShapePoint;

    const NAME: &'static str = "shapes";
    const REQUIRED: bool = false;
    const KEY_FIELD: &'static str = "shape_id,shape_pt_sequence";
    const COLUMNS: &'static [&'static str] = &[
        "shape_id",
        "shape_pt_lat",
        "shape_pt_lon",
        "shape_pt_sequence",
        "shape_dist_traveled",
    ];

    fn decode(&self, row: &mut RowReader<'_>) -> ShapePoint {
        ShapePoint {
            source_row: row.row(),
            shape_id: row.string_field("shape_id", true),
            shape_pt_lat: row.double_field("shape_pt_lat", true, -90.0..=90.0),
            shape_pt_lon: row.double_field("shape_pt_lon", true, -180.0..=180.0),
            shape_pt_sequence: row.int_field("shape_pt_sequence", true, 0..=i32::MAX),
            shape_dist_traveled: row.double_field("shape_dist_traveled", false, 0.0..=f64::MAX),
        }
    }

    fn encode<W: Write>(&self, p: &ShapePoint, row: &mut RowWriter<'_, W>) -> Result<()> {
        row.write_string(p.shape_id.as_deref())?;
        row.write_double(p.shape_pt_lat)?;
        row.write_double(p.shape_pt_lon)?;
        row.write_int(p.shape_pt_sequence)?;
        row.write_double(p.shape_dist_traveled)
    }
}
