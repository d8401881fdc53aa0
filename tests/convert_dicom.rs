use std::path::Path;

use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_dictionary_std::{tags, uids};
use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_raster_rs::image_pipeline::{
    run_batch, ChannelLayout, ConversionConfig, ConversionError, DicomReader, DicomObjectReader,
    DicomToRasterPipeline, dicom::Photometric,
};
use tempfile::TempDir;

const ROWS: u16 = 64;
const COLUMNS: u16 = 80;

struct Fixture<'a> {
    instance_uid: &'a str,
    photometric: &'a str,
    window: Option<(&'a str, &'a str)>,
    size: (u16, u16),
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self {
            instance_uid: "1.2.826.0.1.3680043.2.1125.1",
            photometric: "MONOCHROME2",
            window: None,
            size: (ROWS, COLUMNS),
        }
    }
}

fn write_radiograph(path: &Path, fixture: &Fixture) {
    let (rows, columns) = fixture.size;
    let pixels: Vec<u16> = (0..usize::from(rows) * usize::from(columns))
        .map(|i| (i % 4096) as u16)
        .collect();

    let mut obj = InMemDicomObject::from_element_iter([
        DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::DIGITAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION),
        ),
        DataElement::new(tags::SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from(fixture.instance_uid)),
        DataElement::new(tags::SAMPLES_PER_PIXEL, VR::US, PrimitiveValue::from(1_u16)),
        DataElement::new(
            tags::PHOTOMETRIC_INTERPRETATION,
            VR::CS,
            PrimitiveValue::from(fixture.photometric),
        ),
        DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)),
        DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(columns)),
        DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)),
        DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(12_u16)),
        DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(11_u16)),
        DataElement::new(tags::PIXEL_REPRESENTATION, VR::US, PrimitiveValue::from(0_u16)),
        DataElement::new(tags::RESCALE_INTERCEPT, VR::DS, PrimitiveValue::from("0")),
        DataElement::new(tags::RESCALE_SLOPE, VR::DS, PrimitiveValue::from("1")),
        DataElement::new(tags::PIXEL_DATA, VR::OW, PrimitiveValue::U16(pixels.into())),
    ]);
    if let Some((center, width)) = fixture.window {
        obj.put(DataElement::new(tags::WINDOW_CENTER, VR::DS, PrimitiveValue::from(center)));
        obj.put(DataElement::new(tags::WINDOW_WIDTH, VR::DS, PrimitiveValue::from(width)));
    }

    let file_obj = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::DIGITAL_X_RAY_IMAGE_STORAGE_FOR_PRESENTATION)
                .media_storage_sop_instance_uid(fixture.instance_uid),
        )
        .unwrap();
    file_obj.write_to_file(path).unwrap();
}

#[test]
fn reader_extracts_pixels_and_metadata() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("image.dcm");
    write_radiograph(
        &path,
        &Fixture {
            window: Some(("2048", "4096")),
            ..Fixture::default()
        },
    );

    let source = DicomObjectReader.read_dicom(&path).unwrap();

    assert_eq!(source.pixels.dim(), (usize::from(ROWS), usize::from(COLUMNS)));
    assert_eq!(source.pixels[[0, 1]], 1.0);
    assert_eq!(source.photometric, Photometric::Monochrome2);
    assert_eq!(source.bits_stored, 12);
    assert!(!source.signed);
    assert_eq!(source.instance_uid.as_deref(), Some("1.2.826.0.1.3680043.2.1125.1"));
    assert_eq!(source.transfer_syntax.as_deref(), Some(uids::EXPLICIT_VR_LITTLE_ENDIAN));
    let windows = source.windows.present().unwrap();
    assert_eq!(windows[0].center, 2048.0);
    assert_eq!(windows[0].width, 4096.0);
}

#[test]
fn batch_converts_tree_into_png_and_manifest() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::create_dir_all(input.path().join("patient")).unwrap();
    write_radiograph(&input.path().join("patient").join("chest.dcm"), &Fixture::default());
    // extensionless, found by the DICM magic
    write_radiograph(
        &input.path().join("1.2.840.113619.5"),
        &Fixture {
            instance_uid: "1.2.840.113619.5",
            photometric: "MONOCHROME1",
            ..Fixture::default()
        },
    );
    std::fs::write(input.path().join("readme.txt"), "not an image").unwrap();

    let config = ConversionConfig::builder().max_side(Some(40)).build();
    let pipeline = DicomToRasterPipeline::new(config).unwrap();
    let summary = run_batch(&pipeline, input.path(), output.path()).unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.converted, 2);
    assert_eq!(summary.failed, 0);

    let chest = image::open(output.path().join("patient").join("chest.png")).unwrap();
    assert_eq!((chest.width(), chest.height()), (40, 32));
    // the last UID component is taken as the extension
    assert!(output.path().join("1.2.840.113619.png").exists());

    let manifest = std::fs::read_to_string(summary.manifest.unwrap()).unwrap();
    let mut lines = manifest.lines();
    assert_eq!(lines.next(), Some("sop_instance_uid,png_path,src_rel"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|r| r.starts_with("1.2.840.113619.5,")));
    for row in &rows {
        let png_path = row.split(',').nth(1).unwrap();
        assert!(Path::new(png_path).is_absolute());
    }
    assert!(rows.iter().any(|r| r.starts_with("1.2.826.0.1.3680043.2.1125.1,")));
}

#[test]
fn second_run_without_overwrite_skips_everything() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_radiograph(&input.path().join("a.dcm"), &Fixture::default());

    let pipeline = DicomToRasterPipeline::new(ConversionConfig::default()).unwrap();
    run_batch(&pipeline, input.path(), output.path()).unwrap();
    let first = std::fs::read(output.path().join("a.png")).unwrap();

    let config = ConversionConfig::builder()
        .overwrite(false)
        .channels(ChannelLayout::Replicated)
        .build();
    let pipeline = DicomToRasterPipeline::new(config).unwrap();
    let summary = run_batch(&pipeline, input.path(), output.path()).unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.converted, 0);
    assert_eq!(std::fs::read(output.path().join("a.png")).unwrap(), first);
}

#[test]
fn corrupt_file_is_reported_and_batch_continues() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::write(input.path().join("broken.dcm"), b"definitely not dicom").unwrap();
    write_radiograph(&input.path().join("good.dcm"), &Fixture::default());

    let pipeline = DicomToRasterPipeline::new(ConversionConfig::default()).unwrap();
    let summary = run_batch(&pipeline, input.path(), output.path()).unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.converted, 1);
    assert!(!output.path().join("broken.png").exists());
    assert!(output.path().join("good.png").exists());
}

#[test]
fn image_without_pixels_is_a_decode_error_naming_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.dcm");
    write_radiograph(
        &path,
        &Fixture {
            size: (0, 0),
            ..Fixture::default()
        },
    );

    let err = DicomObjectReader.read_dicom(&path).unwrap_err();

    match err {
        ConversionError::DecodeError { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("unexpected error {:?}", other),
    }
}
