#![allow(missing_docs)]

use std::error::Error;
use std::sync::Arc;

use densearr::array::{
    ArrayError, DataType, DenseArray, DenseArrayBuilder, MemoryOrder, SchemaField, Tensor,
};
use densearr::array_subset::{Selector, SliceRange};
use densearr::context::Context;
use densearr::storage::storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter;
use densearr::storage::store::MemoryEngine;
use densearr::storage::{
    DimensionLayout, EngineConfig, MetadataValue, ObjectKind, ObjectLayout, OpenMode,
    PlatformConfig, StorageEngine, StorageError,
};

/// Create a 4x6 int64 array at timestamp 1 holding `100 * i + j` at `[i, j]`.
fn create_4x6<TEngine: ?Sized + StorageEngine>(
    engine: &Arc<TEngine>,
    uri: &str,
) -> Result<(), Box<dyn Error>> {
    let mut array = DenseArrayBuilder::new([4, 6], DataType::Int64)
        .context(Context::new().with_timestamp(1))
        .create(engine.clone(), uri)?;
    let values = (0..4i64)
        .flat_map(|i| (0..6).map(move |j| 100 * i + j))
        .collect::<Vec<_>>();
    array.write(&[], Tensor::from_elements(values, vec![4, 6])?)?;
    array.close()?;
    Ok(())
}

fn read_i64(
    array: &DenseArray<MemoryEngine>,
    selectors: &[Selector],
    order: MemoryOrder,
) -> Result<ndarray::ArrayD<i64>, Box<dyn Error>> {
    Ok(array.read(selectors, order)?.to_ndarray::<i64>()?)
}

fn expected(shape: &[usize], values: Vec<i64>) -> ndarray::ArrayD<i64> {
    ndarray::ArrayD::from_shape_vec(shape, values).unwrap()
}

#[test]
fn dense_array_create() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    for (shape, data_type) in [
        (vec![10u64], DataType::Int8),
        (vec![2, 3], DataType::Float32),
        (vec![1, 2, 3, 4], DataType::Bool),
    ] {
        let uri = format!("mem://create/{}", shape.len());
        let mut array = DenseArrayBuilder::new(shape.clone(), data_type)
            .create(engine.clone(), &uri)?;
        assert_eq!(array.mode(), OpenMode::Write);
        assert_eq!(array.shape(), shape);
        assert_eq!(array.dimensionality(), shape.len());
        assert_eq!(array.data_type(), data_type);
        assert!(!array.is_sparse());
        assert_eq!(array.schema().fields().len(), shape.len() + 1);
        for (i, field) in array.schema().fields().iter().enumerate() {
            if i < shape.len() {
                assert_eq!(field.name(), format!("dim_{i}"));
                assert_eq!(field.data_type(), DataType::Int64);
            } else {
                assert!(matches!(field, SchemaField::Data { .. }));
                assert_eq!(field.data_type(), data_type);
            }
        }
        array.close()?;
        assert!(DenseArray::exists(engine.as_ref(), &uri)?);

        // The schema round trips through the engine
        let array = DenseArray::open(engine.clone(), &uri, OpenMode::Read, &Context::new())?;
        assert_eq!(array.shape(), shape);
        assert_eq!(array.data_type(), data_type);
    }
    Ok(())
}

#[test]
fn dense_array_create_invalid_shapes() {
    let engine = Arc::new(MemoryEngine::new());
    let shapes: Vec<Vec<Option<u64>>> = vec![
        vec![],
        vec![Some(0)],
        vec![Some(10), Some(0)],
        vec![Some(0), Some(10)],
        vec![Some(1), Some(2), Some(0)],
        vec![None, None],
        vec![Some(10), None],
    ];
    for shape in shapes {
        let result = DenseArrayBuilder::new(shape.clone(), DataType::Float32)
            .create(engine.clone(), "mem://invalid");
        assert!(matches!(result, Err(ArrayError::Value(_))), "{shape:?}");
    }
    assert!(!DenseArray::exists(engine.as_ref(), "mem://invalid").unwrap());
}

#[test]
fn dense_array_create_non_primitive() {
    let engine = Arc::new(MemoryEngine::new());
    for data_type in ["string", "large_string", "list<item: int32>", "struct<a: int8>"] {
        let result = DenseArrayBuilder::new([10], data_type).create(engine.clone(), "mem://np");
        assert!(matches!(result, Err(ArrayError::Type(_))), "{data_type}");
    }
}

#[test]
fn dense_array_create_zero_sized_data_type() {
    let engine = Arc::new(MemoryEngine::new());
    let result =
        DenseArrayBuilder::new([4], DataType::FixedBytes(0)).create(engine.clone(), "mem://zero");
    assert!(matches!(result, Err(ArrayError::Type(_))));
    assert!(engine.describe_object("mem://zero").unwrap().is_none());
}

#[test]
fn dense_array_growable_domain() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new_with_options(
        densearr::storage::store::MemoryEngineOptions {
            growable_domains: true,
            ..Default::default()
        },
    ));
    let array = DenseArrayBuilder::new([Some(10), None], DataType::UInt8)
        .create(engine.clone(), "mem://growable")?;
    assert_eq!(array.shape()[0], 10);
    assert_eq!(array.shape()[1], i64::MAX.unsigned_abs());
    assert!(matches!(
        DenseArrayBuilder::new([None, None], DataType::UInt8).create(engine.clone(), "mem://g2"),
        Err(ArrayError::Value(_))
    ));
    Ok(())
}

#[test]
fn dense_array_write_untyped() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    let array = DenseArrayBuilder::new([2, 2], DataType::Float64).create(engine.clone(), "a")?;
    let result = array.write(&[], vec![0u8; 32]);
    assert!(matches!(result, Err(ArrayError::Type(_))));

    let result = array.write(&[], Tensor::from_elements(vec![1.0f32; 4], vec![2, 2])?);
    assert!(matches!(result, Err(ArrayError::Type(_))));

    let result = array.write(&[], Tensor::from_elements(vec![1.0f64; 2], vec![1, 2])?);
    assert!(matches!(result, Err(ArrayError::Value(_))));
    Ok(())
}

#[test]
fn dense_array_reshape() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    let mut array = DenseArrayBuilder::new([10], DataType::Int32).create(engine.clone(), "a")?;
    assert!(matches!(
        array.reshape([5, 2]),
        Err(ArrayError::NotImplemented(_))
    ));
    array.close()?;
    assert!(matches!(
        array.reshape([5, 2]),
        Err(ArrayError::NotImplemented(_))
    ));
    Ok(())
}

#[test]
fn dense_array_doubly_inclusive() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    let mut array = DenseArrayBuilder::new([10], DataType::Int64).create(engine.clone(), "a")?;
    array.write(&[], Tensor::from_elements((0..10i64).collect(), vec![10])?)?;
    array.close()?;

    let array = DenseArray::open(engine.clone(), "a", OpenMode::Read, &Context::new())?;
    let tensor = array.read(&[Selector::range(2..=4)], MemoryOrder::RowMajor)?;
    assert_eq!(tensor.to_vec::<i64>()?, vec![2, 3, 4]);
    Ok(())
}

#[test]
fn dense_array_slicing() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    create_4x6(&engine, "a")?;

    let cases: Vec<(Vec<Selector>, ndarray::ArrayD<i64>)> = vec![
        (vec![2.into(), 3.into()], expected(&[1, 1], vec![203])),
        (
            vec![(..).into(), 3.into()],
            expected(&[4, 1], vec![3, 103, 203, 303]),
        ),
        (
            vec![2.into()],
            expected(&[1, 6], vec![200, 201, 202, 203, 204, 205]),
        ),
        (
            vec![(..=2).into(), (5..).into()],
            expected(&[3, 1], vec![5, 105, 205]),
        ),
        (
            vec![(0..=2).into(), (5..=5).into()],
            expected(&[3, 1], vec![5, 105, 205]),
        ),
        (
            vec![],
            expected(&[4, 6], (0..4).flat_map(|i| (0..6).map(move |j| 100 * i + j)).collect()),
        ),
    ];

    for read_buffer_bytes in [None, Some("100"), Some("8")] {
        let mut engine_config = EngineConfig::new();
        if let Some(read_buffer_bytes) = read_buffer_bytes {
            engine_config.set(EngineConfig::READ_BUFFER_BYTES, read_buffer_bytes);
        }
        let context = Context::new().with_engine_config(engine_config);
        let array = DenseArray::open(engine.clone(), "a", OpenMode::Read, &context)?;
        for (selectors, expected) in &cases {
            let row_major = read_i64(&array, selectors, MemoryOrder::RowMajor)?;
            assert_eq!(&row_major, expected, "{selectors:?}");
            let column_major = read_i64(&array, selectors, MemoryOrder::ColumnMajor)?;
            assert_eq!(column_major, expected.t(), "{selectors:?}");
        }
    }
    Ok(())
}

#[test]
fn dense_array_column_major_rank_3() -> Result<(), Box<dyn Error>> {
    use ndarray::s;

    let engine = Arc::new(MemoryEngine::new());
    let data = ndarray::Array3::from_shape_vec((2, 3, 4), (0..24i32).collect())?;
    let mut array = DenseArrayBuilder::new([2, 3, 4], DataType::Int32)
        .context(Context::new().with_timestamp(1))
        .create(engine.clone(), "a")?;
    array.write(&[], Tensor::from_ndarray(data.clone().into_dyn())?)?;
    array.close()?;

    let array = DenseArray::open(engine.clone(), "a", OpenMode::Read, &Context::new())?;
    let tensor = array.read(&[], MemoryOrder::ColumnMajor)?;
    assert_eq!(tensor.shape(), &[4, 3, 2]);
    assert_eq!(
        tensor.to_ndarray::<i32>()?,
        data.view().permuted_axes([2, 1, 0]).into_dyn()
    );

    let selectors = [Selector::range(0..=1), 1.into(), Selector::range(1..=2)];
    let tensor = array.read(&selectors, MemoryOrder::ColumnMajor)?;
    assert_eq!(tensor.shape(), &[2, 1, 2]);
    assert_eq!(
        tensor.to_ndarray::<i32>()?,
        data.slice(s![0..2, 1..2, 1..3])
            .permuted_axes([2, 1, 0])
            .into_dyn()
    );
    Ok(())
}

#[test]
fn dense_array_write_sliced_ndarray() -> Result<(), Box<dyn Error>> {
    use ndarray::s;

    let engine = Arc::new(MemoryEngine::new());
    let data = ndarray::Array3::from_shape_vec((2, 3, 4), (0..24i32).collect())?;
    let mut array = DenseArrayBuilder::new([1, 3, 4], DataType::Int32).create(engine.clone(), "a")?;
    array.write(&[], Tensor::from_ndarray(data.slice_move(s![1.., .., ..]).into_dyn())?)?;
    array.close()?;

    let array = DenseArray::open(engine.clone(), "a", OpenMode::Read, &Context::new())?;
    let tensor = array.read(&[], MemoryOrder::RowMajor)?;
    assert_eq!(tensor.to_vec::<i32>()?, (12..24).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn dense_array_read_passes() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(PerformanceMetricsStorageAdapter::new(Arc::new(
        MemoryEngine::new(),
    )));
    create_4x6(&engine, "a")?;

    let context = Context::new()
        .with_engine_config(EngineConfig::new().with(EngineConfig::READ_BUFFER_BYTES, "100"));
    let small = DenseArray::open(engine.clone(), "a", OpenMode::Read, &context)?;
    engine.reset();
    let tensor_small = small.read(&[], MemoryOrder::RowMajor)?;
    assert_eq!(engine.reads(), 1);
    assert_eq!(engine.read_passes(), 2); // 12 cells of 8 bytes per pass
    assert_eq!(engine.bytes_read(), 4 * 6 * 8);

    let large = DenseArray::open(engine.clone(), "a", OpenMode::Read, &Context::new())?;
    engine.reset();
    let tensor_large = large.read(&[], MemoryOrder::RowMajor)?;
    assert_eq!(engine.read_passes(), 1);
    assert_eq!(tensor_small, tensor_large);
    Ok(())
}

#[test]
fn dense_array_indexing_errors() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    let mut array = DenseArrayBuilder::new([10], DataType::Int64).create(engine.clone(), "a")?;
    array.write(&[], Tensor::from_elements(vec![0i64; 10], vec![10])?)?;
    array.close()?;
    let mut array = DenseArrayBuilder::new([5], DataType::Int64).create(engine.clone(), "b")?;
    array.write(&[], Tensor::from_elements(vec![0i64; 5], vec![5])?)?;
    array.close()?;

    let a = DenseArray::open(engine.clone(), "a", OpenMode::Read, &Context::new())?;
    let b = DenseArray::open(engine.clone(), "b", OpenMode::Read, &Context::new())?;

    // Points reach the engine unvalidated
    for point in [-1, 12] {
        assert!(matches!(
            a.read(&[point.into()], MemoryOrder::RowMajor),
            Err(ArrayError::Engine(StorageError::OutOfDomain { .. }))
        ));
    }

    let value_errors: Vec<(&DenseArray<MemoryEngine>, Vec<Selector>)> = vec![
        (&a, vec![1.into(), 2.into()]),
        (&a, vec![Selector::range(-1..=2)]),
        (&b, vec![Selector::range(10..=20)]),
        (&a, vec![SliceRange::new(None, None).with_step(-1).into()]),
        (&a, vec![SliceRange::new(Some(3), Some(2)).with_step(1).into()]),
        (&a, vec![SliceRange::new(Some(1), Some(8)).with_step(2).into()]),
        (&a, vec![vec![1, 3, 5].into()]),
    ];
    for (array, selectors) in value_errors {
        assert!(
            matches!(
                array.read(&selectors, MemoryOrder::RowMajor),
                Err(ArrayError::Value(_))
            ),
            "{selectors:?}"
        );
    }

    // The handle remains usable after an error
    assert_eq!(
        a.read(&[Selector::range(..=1)], MemoryOrder::RowMajor)?
            .to_vec::<i64>()?,
        vec![0, 0]
    );
    Ok(())
}

#[test]
fn dense_array_tile_extents() -> Result<(), Box<dyn Error>> {
    testing_logger::setup();
    let engine = Arc::new(MemoryEngine::new());
    let platform_config: PlatformConfig =
        serde_json::from_str(r#"{"create": {"dims": {"dim_0": {"tile": 2048}}}}"#)?;
    DenseArrayBuilder::new([100, 5000], DataType::Float32)
        .platform_config(platform_config)
        .create(engine.clone(), "a")?;
    let descriptor = engine.describe_object("a")?.unwrap();
    let tiles = descriptor
        .dimensions
        .iter()
        .map(|dimension| dimension.tile)
        .collect::<Vec<_>>();
    assert_eq!(tiles, vec![100, 2048]);
    testing_logger::validate(|captured_logs| {
        assert!(
            captured_logs
                .iter()
                .any(|log| log.level == log::Level::Warn && log.body.contains("dim_0"))
        );
    });
    Ok(())
}

#[test]
fn dense_array_timestamped_ops() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    let mut array = DenseArrayBuilder::new([2, 2], DataType::UInt8)
        .context(Context::new().with_timestamp(1))
        .create(engine.clone(), "a")?;
    array.write(&[], Tensor::from_elements(vec![0u8; 4], vec![2, 2])?)?;
    array.close()?;

    for (timestamp, cell) in [(10, 0), (20, 1)] {
        let mut array = DenseArray::open_with_timestamp(
            engine.clone(),
            "a",
            OpenMode::Write,
            timestamp,
            &Context::new(),
        )?;
        array.write(
            &[cell.into(), cell.into()],
            Tensor::from_elements(vec![1u8], vec![1, 1])?,
        )?;
        array.close()?;
    }

    let read_at = |timestamp: Option<u64>| -> Result<Vec<u8>, Box<dyn Error>> {
        let array = match timestamp {
            Some(timestamp) => DenseArray::open_with_timestamp(
                engine.clone(),
                "a",
                OpenMode::Read,
                timestamp,
                &Context::new(),
            )?,
            None => DenseArray::open(engine.clone(), "a", OpenMode::Read, &Context::new())?,
        };
        Ok(array.read(&[], MemoryOrder::RowMajor)?.to_vec::<u8>()?)
    };
    assert_eq!(read_at(None)?, vec![1, 0, 0, 1]);
    assert_eq!(read_at(Some(25))?, vec![1, 0, 0, 1]);
    assert_eq!(read_at(Some(15))?, vec![1, 0, 0, 0]);
    assert_eq!(read_at(Some(10))?, vec![1, 0, 0, 0]);
    assert_eq!(read_at(Some(5))?, vec![0, 0, 0, 0]);
    Ok(())
}

#[test]
fn dense_array_fixed_timestamp_metadata() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    let context = Context::new().with_timestamp(999);
    let mut array = DenseArrayBuilder::new([10], DataType::Int64)
        .context(context.clone())
        .create(engine.clone(), "a")?;
    assert_eq!(array.timestamp(), 999);
    array.metadata().set("foo", "bar")?;
    assert_eq!(array.metadata().get("foo")?, MetadataValue::from("bar"));
    array.close()?;

    let array = DenseArray::open(engine.clone(), "a", OpenMode::Read, &context)?;
    assert_eq!(array.timestamp(), 999);
    assert_eq!(array.metadata().get("foo")?, MetadataValue::from("bar"));

    let array = DenseArray::open_with_timestamp(engine.clone(), "a", OpenMode::Read, 1000, &context)?;
    assert_eq!(array.metadata().get("foo")?, MetadataValue::from("bar"));
    assert!(matches!(
        array.metadata().get_at("foo", 500),
        Err(ArrayError::KeyNotFound(_))
    ));

    let array = DenseArray::open_with_timestamp(
        engine.clone(),
        "a",
        OpenMode::Read,
        500,
        &Context::new(),
    )?;
    assert!(!array.metadata().contains("foo")?);

    // An explicit timestamp cannot lower the context timestamp
    assert!(matches!(
        DenseArray::open_with_timestamp(engine.clone(), "a", OpenMode::Read, 111, &context),
        Err(ArrayError::Configuration(_))
    ));
    Ok(())
}

#[test]
fn dense_array_metadata_requires_write_mode() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    create_4x6(&engine, "a")?;
    let array = DenseArray::open(engine.clone(), "a", OpenMode::Read, &Context::new())?;
    assert!(matches!(
        array.metadata().set("foo", 1.5),
        Err(ArrayError::Lifecycle(_))
    ));
    Ok(())
}

#[test]
fn dense_array_invalid_engine_config() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    create_4x6(&engine, "a")?;
    let context = Context::new()
        .with_engine_config(EngineConfig::new().with(EngineConfig::READ_BUFFER_BYTES, "lots"));
    let result = DenseArray::open(engine.clone(), "a", OpenMode::Read, &context);
    match result {
        Err(ArrayError::Configuration(message)) => {
            assert!(message.contains("read_buffer_bytes"));
            assert!(message.contains("lots"));
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert!(matches!(
        DenseArrayBuilder::new([2], DataType::Int8)
            .context(context)
            .create(engine.clone(), "b"),
        Err(ArrayError::Configuration(_))
    ));
    assert!(!DenseArray::exists(engine.as_ref(), "b")?);
    Ok(())
}

#[test]
fn dense_array_not_found_and_kind_mismatch() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    assert!(matches!(
        DenseArray::open(engine.clone(), "missing", OpenMode::Read, &Context::new()),
        Err(ArrayError::NotFound(_))
    ));
    assert!(!DenseArray::exists(engine.as_ref(), "missing")?);

    let layout = ObjectLayout {
        kind: ObjectKind::SparseArray,
        dimensions: vec![DimensionLayout {
            name: "dim_0".to_string(),
            size: 10,
        }],
        cell_size: 8,
        document: serde_json::Value::Null,
    };
    engine.create_object("sparse", layout, &PlatformConfig::default(), 1)?;
    assert!(matches!(
        DenseArray::open(engine.clone(), "sparse", OpenMode::Read, &Context::new()),
        Err(ArrayError::KindMismatch {
            actual: ObjectKind::SparseArray,
            ..
        })
    ));
    assert!(!DenseArray::exists(engine.as_ref(), "sparse")?);
    assert!(matches!(
        DenseArrayBuilder::new([10], DataType::Int64).create(engine.clone(), "sparse"),
        Err(ArrayError::Value(_))
    ));

    create_4x6(&engine, "dense")?;
    assert!(matches!(
        DenseArrayBuilder::new([10], DataType::Int64).create(engine.clone(), "dense"),
        Err(ArrayError::Engine(StorageError::AlreadyExists(..)))
    ));
    Ok(())
}

#[test]
fn dense_array_single_writer() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    create_4x6(&engine, "a")?;
    let mut writer = DenseArray::open(engine.clone(), "a", OpenMode::Write, &Context::new())?;
    assert!(matches!(
        DenseArray::open(engine.clone(), "a", OpenMode::Write, &Context::new()),
        Err(ArrayError::Engine(StorageError::WriterConflict(_)))
    ));
    // Readers are unaffected
    let reader = DenseArray::open(engine.clone(), "a", OpenMode::Read, &Context::new())?;
    assert_eq!(reader.shape(), vec![4, 6]);
    writer.close()?;
    DenseArray::open(engine.clone(), "a", OpenMode::Write, &Context::new())?;
    Ok(())
}

#[test]
fn dense_array_concurrent_readers() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(MemoryEngine::new());
    create_4x6(&engine, "a")?;
    let reference = DenseArray::open(engine.clone(), "a", OpenMode::Read, &Context::new())?
        .read(&[], MemoryOrder::RowMajor)?;

    std::thread::scope(|scope| {
        let handles = (0..4i64)
            .map(|row| {
                let engine = engine.clone();
                scope.spawn(move || {
                    let array =
                        DenseArray::open(engine, "a", OpenMode::Read, &Context::new()).unwrap();
                    array
                        .read(&[row.into()], MemoryOrder::RowMajor)
                        .unwrap()
                        .to_vec::<i64>()
                        .unwrap()
                })
            })
            .collect::<Vec<_>>();
        let rows = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(rows, reference.to_vec::<i64>().unwrap());
    });
    assert_eq!(engine.open_handles(), 0);
    Ok(())
}

#[test]
fn dense_array_dyn_engine() -> Result<(), Box<dyn Error>> {
    let engine: Arc<dyn StorageEngine> = Arc::new(MemoryEngine::new());
    create_4x6(&engine, "a")?;
    let array = DenseArray::open(engine.clone(), "a", OpenMode::Read, &Context::new())?;
    let tensor = array.read(&[3.into(), 5.into()], MemoryOrder::RowMajor)?;
    assert_eq!(tensor.to_vec::<i64>()?, vec![305]);
    Ok(())
}
