use arrow2::array::*;
use arrow2::chunk::Chunk;
use arrow2::datatypes::*;

use crate::records::FootprintRecord;

/// Schema of the output table, in column order.
pub fn footprint_schema() -> Schema {
    Schema::from(vec![
        Field::new("country_code", DataType::Utf8, true),
        Field::new("alpha_2_code", DataType::Utf8, true),
        Field::new("production_quantity", DataType::Float64, true),
        Field::new("area_sqkm", DataType::Float64, true),
        Field::new("static_impact", DataType::Int64, true),
        Field::new("total_static_impact", DataType::Int64, true),
        Field::new("total_dynamic_impact", DataType::Int64, true),
        Field::new("static_impact_2020", DataType::Int64, true),
    ])
}

/// Build the columnar chunk matching [`footprint_schema`].
pub fn to_chunk(rows: &[FootprintRecord]) -> Chunk<Box<dyn Array>> {
    // ---- UTF8 builder ----
    macro_rules! build_utf8 {
        ($name:ident) => {{
            let mut col = MutableUtf8Array::<i32>::with_capacity(rows.len());
            for r in rows {
                col.push(r.$name.as_deref());
            }
            let col: Utf8Array<i32> = col.into();
            col.boxed()
        }};
    }

    // ---- Numeric primitive builder ----
    macro_rules! build_prim {
        ($name:ident, $ty:ty) => {{
            let mut col = MutablePrimitiveArray::<$ty>::with_capacity(rows.len());
            for r in rows {
                col.push(r.$name);
            }
            let col: PrimitiveArray<$ty> = col.into();
            col.boxed()
        }};
    }

    Chunk::new(vec![
        build_utf8!(country_code),
        build_utf8!(alpha_2_code),
        build_prim!(production_quantity, f64),
        build_prim!(area_sqkm, f64),
        build_prim!(static_impact, i64),
        build_prim!(total_static_impact, i64),
        build_prim!(total_dynamic_impact, i64),
        build_prim!(static_impact_2020, i64),
    ])
}
