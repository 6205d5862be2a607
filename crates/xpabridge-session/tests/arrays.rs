//! Arrays and FITS files through a bound session.

mod common;

use std::sync::Arc;

use common::FakeViewer;
use rand::Rng;
use xpabridge_marshal::{
    ArrayBuffer, ByteOrder, ContainerCodec, ElementKind, FitsBlocks, MarshalError,
    NoContainerCodec, build_fits,
};
use xpabridge_session::{Session, SessionConfig, SessionError};
use xpabridge_transport::{MemoryTransport, Responder};

async fn open_viewer() -> (Session<MemoryTransport>, FakeViewer) {
    let transport = Arc::new(MemoryTransport::new());
    let viewer = FakeViewer::new();
    transport.register("DS9", "pytest", viewer.clone());
    let session = Session::open(transport, "pytest", SessionConfig::default())
        .await
        .unwrap();
    (session, viewer)
}

// =========================================================================
// Arrays
// =========================================================================

#[tokio::test]
async fn test_set_array_sends_exact_command() {
    let (mut session, viewer) = open_viewer().await;
    let values: Vec<i32> = (0..20).collect();
    let array = ArrayBuffer::from_elements(&values, &[5, 4])
        .unwrap()
        .with_order(ByteOrder::Big);

    assert_eq!(session.set_array(&array, None).await.unwrap(), 1);

    assert_eq!(
        viewer.commands(),
        vec!["array [xdim=4,ydim=5,bitpix=32,endian=big]"]
    );
    assert_eq!(viewer.image().unwrap().to_vec::<i32>().unwrap(), values);
}

#[tokio::test]
async fn test_float_image_round_trips_bit_exact() {
    let (mut session, _viewer) = open_viewer().await;
    let mut rng = rand::rng();
    let values: Vec<f32> = (0..100).map(|_| rng.random_range(-1e4..1e4)).collect();
    let array = ArrayBuffer::from_elements(&values, &[10, 10]).unwrap();

    session.set_array(&array, None).await.unwrap();
    let back = session.get_array().await.unwrap();

    assert_eq!(back.dims(), &[10, 10]);
    assert_eq!(back.kind(), ElementKind::F32);
    let got = back.to_vec::<f32>().unwrap();
    assert!(values.iter().zip(&got).all(|(a, b)| a.to_bits() == b.to_bits()));
}

#[tokio::test]
async fn test_rectangular_image_keeps_rows_and_columns() {
    let (mut session, viewer) = open_viewer().await;
    let values: Vec<u16> = (0..6).collect();
    // 2 rows, 3 columns
    viewer.show(ArrayBuffer::from_elements(&values, &[2, 3]).unwrap());

    let back = session.get_array().await.unwrap();

    assert_eq!(back.height(), 2);
    assert_eq!(back.width(), 3);
    assert_eq!(back.to_vec::<u16>().unwrap(), values);
}

#[tokio::test]
async fn test_cube_round_trip() {
    let (mut session, _viewer) = open_viewer().await;
    let values: Vec<f64> = (0..24).map(f64::from).collect();
    let cube = ArrayBuffer::from_elements(&values, &[2, 3, 4]).unwrap();

    session.set_array(&cube, None).await.unwrap();
    let back = session.get_array().await.unwrap();

    assert_eq!(back.dims(), &[2, 3, 4]);
    assert_eq!(back.to_vec::<f64>().unwrap(), values);
}

#[tokio::test]
async fn test_int8_is_widened_before_sending() {
    let (mut session, viewer) = open_viewer().await;
    let array = ArrayBuffer::from_elements(&[-3i8, 4, -5, 6], &[2, 2]).unwrap();

    session.set_array(&array, None).await.unwrap();

    let shown = viewer.image().unwrap();
    assert_eq!(shown.kind(), ElementKind::I16);
    assert_eq!(shown.to_vec::<i16>().unwrap(), vec![-3, 4, -5, 6]);
}

#[tokio::test]
async fn test_uint64_needs_explicit_kind() {
    let (mut session, viewer) = open_viewer().await;
    let array = ArrayBuffer::from_elements(&[1u64, 2, 3, 4], &[2, 2]).unwrap();

    let err = session.set_array(&array, None).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Marshal(MarshalError::UnsupportedKind(ElementKind::U64))
    ));
    assert!(viewer.commands().is_empty());

    session.set_array(&array, Some(ElementKind::F64)).await.unwrap();
    assert_eq!(
        viewer.image().unwrap().to_vec::<f64>().unwrap(),
        vec![1.0, 2.0, 3.0, 4.0]
    );
}

#[tokio::test]
async fn test_get_array_without_image_reports_viewer_error() {
    let (mut session, _viewer) = open_viewer().await;
    let err = session.get_array().await.unwrap_err();
    assert_eq!(err.to_string(), "no image loaded");
}

/// Reports a shape too large to address in memory.
struct Oversized;

impl Responder for Oversized {
    fn get(&self, params: Option<&str>) -> Result<Vec<u8>, String> {
        match params.unwrap_or("") {
            "fits width" | "fits height" => Ok(b"4294967296\n".to_vec()),
            "fits depth" => Ok(b"1\n".to_vec()),
            "fits bitpix" => Ok(b"8\n".to_vec()),
            "array" => Ok(vec![0; 16]),
            other => Err(format!("unknown command: {other}")),
        }
    }
}

#[tokio::test]
async fn test_get_array_rejects_oversized_shape() {
    let transport = Arc::new(MemoryTransport::new());
    transport.register("DS9", "huge", Oversized);
    let mut session = Session::open(transport, "huge", SessionConfig::default())
        .await
        .unwrap();

    let err = session.get_array().await.unwrap_err();

    if cfg!(target_pointer_width = "64") {
        assert!(matches!(
            err,
            SessionError::Marshal(MarshalError::TooLarge { kind: ElementKind::U8, .. })
        ));
    } else {
        assert!(matches!(err, SessionError::Marshal(MarshalError::InvalidNumber { .. })));
    }
}

// =========================================================================
// FITS files
// =========================================================================

fn small_fits() -> Vec<u8> {
    build_fits(
        &[
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =                    2",
            "NAXIS2  =                    2",
        ],
        &[1, 2, 3, 4],
    )
}

#[tokio::test]
async fn test_container_round_trip() {
    let (mut session, viewer) = open_viewer().await;
    let document = FitsBlocks.decode(&small_fits()).unwrap();

    assert_eq!(session.set_container(&FitsBlocks, &document).await.unwrap(), 1);
    assert_eq!(viewer.fits().unwrap(), small_fits());

    let back = session.get_container(&FitsBlocks).await.unwrap();
    assert_eq!(back, document);
    assert_eq!(back.keyword("NAXIS1").as_deref(), Some("2"));
}

#[tokio::test]
async fn test_container_without_codec_is_unsupported() {
    let (mut session, viewer) = open_viewer().await;

    let err = session
        .set_container(&NoContainerCodec, &small_fits())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SessionError::Marshal(MarshalError::CodecUnavailable(_))
    ));
    assert!(viewer.commands().is_empty());
}
