use ndarray::{Array1, Array2, Array3};
use std::fs::File;
use std::io::Cursor;
use std::sync::Mutex;

use gpig::PipelineError;
use gpig::acquisition::{AcquisitionError, LocalArchive, Product, TimeSpan, load_data};
use gpig::align::ScalarField;
use gpig::bbox::BoundingBox;
use gpig::driver::{DriverStats, FailurePolicy, NoProgress};
use gpig::inversion::{InversionError, Pigments, PixelSpectrum};
use gpig::output::{Pigment, write_tiff};
use gpig::pipeline::{RunOptions, process_swath};
use gpig::region::{Console, RegionError};
use gpig::swath::Swath;

/// 4x4 swath on an integer lat/lon grid.
fn swath_with(rrs: Array3<f64>) -> Swath {
    let rrs_unc = rrs.mapv(|v| v * 0.05);
    let latitude = Array2::from_shape_fn((4, 4), |(i, _)| i as f64);
    let longitude = Array2::from_shape_fn((4, 4), |(_, j)| j as f64);
    Swath::new(vec![443.0, 555.0], rrs, rrs_unc, latitude, longitude).unwrap()
}

fn reflectance() -> Array3<f64> {
    Array3::from_shape_fn((4, 4, 2), |(i, j, k)| 0.002 + 0.001 * (i + j + k) as f64)
}

fn swath() -> Swath {
    swath_with(reflectance())
}

fn field(value: f64) -> ScalarField {
    let axis = Array1::from_iter((0..4).map(|v| v as f64));
    ScalarField::new(axis.clone(), axis, Array2::from_elem((4, 4), value)).unwrap()
}

fn stub(_: &PixelSpectrum<'_>) -> Result<Vec<Pigments>, InversionError> {
    Ok(vec![
        Pigments::from([1.0, 2.0, 3.0, 4.0]),
        Pigments::from([9.0, 9.0, 9.0, 9.0]),
    ])
}

#[test]
fn two_by_two_region_keeps_only_the_complete_cell() {
    // The box below keeps swath lines 1..=2 and pixels 1..=2.
    let mut rrs = reflectance();
    rrs[[2, 1, 0]] = f64::NAN;
    rrs[[2, 2, 0]] = f64::NAN;
    let swath = swath_with(rrs);

    let mut salinity_values = Array2::from_elem((4, 4), 34.5);
    salinity_values[[1, 2]] = f64::NAN;
    let axis = Array1::from_iter((0..4).map(|v| v as f64));
    let salinity = ScalarField::new(axis.clone(), axis, salinity_values).unwrap();
    let temperature = field(288.0);

    let temperatures = Mutex::new(Vec::new());
    let inversion = |pixel: &PixelSpectrum<'_>| -> Result<Vec<Pigments>, InversionError> {
        temperatures.lock().unwrap().push(pixel.temperature);
        stub(pixel)
    };

    let mut region = BoundingBox::new(2.5, 0.5, 2.5, 0.5).unwrap();
    let output = process_swath(
        &swath,
        &salinity,
        &temperature,
        &mut region,
        &inversion,
        &NoProgress,
        RunOptions::default(),
    )
    .unwrap();

    assert_eq!(output.product.subset().shape(), (2, 2));
    assert_eq!(
        output.stats,
        DriverStats {
            computed: 1,
            skipped: 3,
            failed: 0
        }
    );
    assert_eq!(output.product.pigments().get((0, 0)), [1.0, 2.0, 3.0, 4.0]);
    for cell in [(0, 1), (1, 0), (1, 1)] {
        assert!(output.product.pigments().get(cell).iter().all(|v| v.is_nan()));
    }
    assert_eq!(temperatures.into_inner().unwrap(), vec![15.0]);

    let chla = output.product.stats(Pigment::Chla);
    assert_eq!(chla.valid, 1);
    assert_eq!(chla.total, 4);
}

#[test]
fn exported_product_has_every_page() {
    let swath = swath();
    let mut region = BoundingBox::new(2.5, 0.5, 2.5, 0.5).unwrap();
    let output = process_swath(
        &swath,
        &field(35.0),
        &field(283.0),
        &mut region,
        &stub,
        &NoProgress,
        RunOptions {
            policy: FailurePolicy::Skip,
            parallel: true,
        },
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pigments.tif");
    write_tiff(&output.product, &path).unwrap();

    let mut decoder = tiff::decoder::Decoder::new(File::open(&path).unwrap()).unwrap();
    let mut pages = 1;
    while decoder.more_images() {
        decoder.next_image().unwrap();
        pages += 1;
    }
    assert_eq!(pages, 6);
}

#[test]
fn box_outside_coverage_is_rejected_at_input() {
    let swath = swath();
    let script = "40\n-5\n";
    let mut console = Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());

    let err = process_swath(
        &swath,
        &field(35.0),
        &field(283.0),
        &mut console,
        &stub,
        &NoProgress,
        RunOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Region(RegionError::InputClosed)
    ));

    let (_, output) = console.into_inner();
    let output = String::from_utf8(output).unwrap();
    assert_eq!(output.matches("Value must be between 3 and 0.").count(), 2);
    assert!(!output.contains("Could not create boundary box"));

    let mut fixed = BoundingBox::new(45.0, 40.0, -60.0, -70.0).unwrap();
    let err = process_swath(
        &swath,
        &field(35.0),
        &field(283.0),
        &mut fixed,
        &stub,
        &NoProgress,
        RunOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Region(RegionError::OutsideCoverage { .. })
    ));
}

#[test]
fn empty_acquisition_is_reported_without_crashing() {
    let archive = tempfile::tempdir().unwrap();
    let downloads = tempfile::tempdir().unwrap();

    let span = TimeSpan::new(
        chrono::NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        chrono::NaiveDate::from_ymd_opt(2024, 7, 2).unwrap(),
    )
    .unwrap();
    let bbox = BoundingBox::from_corners(-70.0, 38.0, -60.0, 45.0).unwrap();

    let err = load_data(
        &LocalArchive::new(archive.path()),
        &span,
        &bbox,
        downloads.path(),
    )
    .unwrap_err();

    match err {
        AcquisitionError::NoData(missing) => assert_eq!(missing, Product::ALL.to_vec()),
        other => panic!("unexpected error: {other}"),
    }
}
