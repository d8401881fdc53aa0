//! DICOM reader implementation using the dicom-rs crates.
//!
//! Files are opened leniently (the 128-byte preamble is optional) and pixel
//! data is decoded through `dicom-pixeldata`, which covers native encodings
//! and the compressed transfer syntaxes registered in
//! `dicom-transfer-syntax-registry`. Calibration attributes are read one by
//! one so a single malformed value never prevents decoding the image.

use std::path::Path;

use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_object::file::ReadPreamble;
use dicom_object::{InMemDicomObject, OpenFileOptions};
use dicom_pixeldata::{DecodedPixelData, PixelDecoder, PixelRepresentation, PlanarConfiguration};
use ndarray::{ArrayD, IxDyn};
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::dicom::reader::DicomReader;
use crate::image_pipeline::dicom::shape::reduce_to_plane;
use crate::image_pipeline::dicom::types::{
    Attribute, Photometric, Rescale, SourceImage, VoiLut, VoiLutFunction, WindowLevel,
};

/// A VOI LUT descriptor entry count of 0 means 2^16 entries.
const FULL_LUT_ENTRIES: usize = 65536;

/// DICOM reader backed by `dicom-object` and `dicom-pixeldata`.
pub struct DicomObjectReader;

/// Memory layout of the decoded pixel payload.
#[derive(Debug, Clone, Copy)]
struct PixelLayout {
    rows: usize,
    columns: usize,
    frames: usize,
    samples_per_pixel: usize,
    bits_allocated: u16,
    bits_stored: u16,
    signed: bool,
    planar: bool,
}

impl PixelLayout {
    /// Layout as reported by the decoder, which may differ from the data set
    /// once a codec has interleaved or unpacked the payload.
    fn from_decoded(decoded: &DecodedPixelData<'_>) -> Self {
        Self {
            rows: decoded.rows() as usize,
            columns: decoded.columns() as usize,
            frames: (decoded.number_of_frames() as usize).max(1),
            samples_per_pixel: usize::from(decoded.samples_per_pixel()).max(1),
            bits_allocated: decoded.bits_allocated(),
            bits_stored: decoded.bits_stored(),
            signed: matches!(decoded.pixel_representation(), PixelRepresentation::Signed),
            planar: matches!(decoded.planar_configuration(), PlanarConfiguration::PixelFirst),
        }
    }

    fn is_supported(&self) -> bool {
        matches!(self.bits_allocated, 8 | 16 | 32)
    }

    fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_allocated / 8)
    }

    /// Total number of samples, `None` if it does not fit in memory addressing.
    fn sample_count(&self) -> Option<usize> {
        self.frames
            .checked_mul(self.rows)?
            .checked_mul(self.columns)?
            .checked_mul(self.samples_per_pixel)
    }

    /// Shape as `[frames?, rows, columns, samples?]`, single axes dropped.
    fn shape(&self) -> Vec<usize> {
        let mut shape = Vec::with_capacity(4);
        if self.frames > 1 {
            shape.push(self.frames);
        }
        shape.push(self.rows);
        shape.push(self.columns);
        if self.samples_per_pixel > 1 {
            shape.push(self.samples_per_pixel);
        }
        shape
    }
}

impl DicomReader for DicomObjectReader {
    fn read_dicom(&self, path: &Path) -> Result<SourceImage> {
        debug!("Opening DICOM file {}", path.display());

        let obj = OpenFileOptions::new()
            .read_preamble(ReadPreamble::Auto)
            .open_file(path)
            .map_err(|e| ConversionError::DecodeError {
                path: path.to_path_buf(),
                transfer_syntax: None,
                message: e.to_string(),
            })?;

        let transfer_syntax = Some(
            obj.meta()
                .transfer_syntax()
                .trim_end_matches(['\0', ' '])
                .to_string(),
        );
        let decode_error = |message: String| ConversionError::DecodeError {
            path: path.to_path_buf(),
            transfer_syntax: transfer_syntax.clone(),
            message,
        };

        let decoded = obj
            .decode_pixel_data()
            .map_err(|e| decode_error(e.to_string()))?;
        let layout = PixelLayout::from_decoded(&decoded);
        debug!(?layout, "Pixel layout");

        if layout.rows == 0 || layout.columns == 0 {
            return Err(decode_error(format!(
                "image has no pixels ({}x{})",
                layout.columns, layout.rows
            )));
        }
        if !layout.is_supported() {
            return Err(ConversionError::UnsupportedFormat(format!(
                "{}: BitsAllocated {} (TS={})",
                path.display(),
                layout.bits_allocated,
                transfer_syntax.as_deref().unwrap_or("unknown")
            )));
        }

        let samples = decode_samples(decoded.data(), &layout).map_err(decode_error)?;
        let pixels = reduce_to_plane(samples).map_err(decode_error)?;

        let signed = layout.signed;
        let instance_uid = str_attr(&obj, tags::SOP_INSTANCE_UID).or_else(|| {
            let uid = obj
                .meta()
                .media_storage_sop_instance_uid()
                .trim_end_matches(['\0', ' ']);
            (!uid.is_empty()).then(|| uid.to_string())
        });

        Ok(SourceImage {
            path: path.to_path_buf(),
            pixels,
            photometric: str_attr(&obj, tags::PHOTOMETRIC_INTERPRETATION)
                .map(|p| Photometric::parse(&p))
                .unwrap_or_default(),
            rescale: read_rescale(&obj),
            windows: read_windows(&obj),
            voi_lut: read_voi_lut(&obj, signed),
            voi_lut_function: read_voi_lut_function(&obj),
            bits_stored: layout.bits_stored,
            signed,
            number_of_frames: layout.frames as u32,
            instance_uid,
            transfer_syntax,
        })
    }
}

fn float_attr(obj: &InMemDicomObject, tag: Tag) -> Option<std::result::Result<f64, String>> {
    let element = obj.element(tag).ok()?;
    Some(element.to_float64().map_err(|e| e.to_string()))
}

fn str_attr(obj: &InMemDicomObject, tag: Tag) -> Option<String> {
    let value = obj.element(tag).ok()?.to_str().ok()?;
    let value = value.trim_matches(['\0', ' ']);
    (!value.is_empty()).then(|| value.to_string())
}

fn read_rescale(obj: &InMemDicomObject) -> Attribute<Rescale> {
    let slope = float_attr(obj, tags::RESCALE_SLOPE);
    let intercept = float_attr(obj, tags::RESCALE_INTERCEPT);
    match (slope, intercept) {
        (None, None) => Attribute::Absent,
        (slope, intercept) => match (slope.unwrap_or(Ok(1.0)), intercept.unwrap_or(Ok(0.0))) {
            (Ok(slope), Ok(intercept)) => Attribute::Present(Rescale { slope, intercept }),
            (Err(e), _) | (_, Err(e)) => Attribute::Malformed(e),
        },
    }
}

fn read_windows(obj: &InMemDicomObject) -> Attribute<Vec<WindowLevel>> {
    let centers = obj.element(tags::WINDOW_CENTER).ok();
    let widths = obj.element(tags::WINDOW_WIDTH).ok();
    match (centers, widths) {
        (None, None) => Attribute::Absent,
        (Some(centers), Some(widths)) => {
            match (centers.to_multi_float64(), widths.to_multi_float64()) {
                (Ok(centers), Ok(widths)) if !centers.is_empty() && !widths.is_empty() => {
                    Attribute::Present(
                        centers
                            .into_iter()
                            .zip(widths)
                            .map(|(center, width)| WindowLevel { center, width })
                            .collect(),
                    )
                }
                (Ok(_), Ok(_)) => Attribute::Malformed("empty window values".to_string()),
                (Err(e), _) | (_, Err(e)) => Attribute::Malformed(e.to_string()),
            }
        }
        _ => Attribute::Malformed("window center and width must both be present".to_string()),
    }
}

fn read_voi_lut(obj: &InMemDicomObject, signed: bool) -> Attribute<VoiLut> {
    let Ok(sequence) = obj.element(tags::VOILUT_SEQUENCE) else {
        return Attribute::Absent;
    };
    let Some(item) = sequence.items().and_then(|items| items.first()) else {
        return Attribute::Malformed("VOI LUT sequence has no items".to_string());
    };

    let descriptor = match item.element(tags::LUT_DESCRIPTOR).map(|e| e.to_multi_int::<i64>()) {
        Ok(Ok(descriptor)) if descriptor.len() == 3 => descriptor,
        _ => return Attribute::Malformed("invalid LUT descriptor".to_string()),
    };
    let data = match item.element(tags::LUT_DATA).map(|e| e.to_multi_int::<i64>()) {
        Ok(Ok(data)) => data,
        _ => return Attribute::Malformed("missing LUT data".to_string()),
    };

    let entries = match descriptor[0] {
        0 => FULL_LUT_ENTRIES,
        n => n as usize,
    };
    if data.len() != entries {
        return Attribute::Malformed(format!(
            "LUT descriptor declares {} entries, found {}",
            entries,
            data.len()
        ));
    }

    // first mapped value is stored as US even for signed pixel data
    let mut first_mapped = descriptor[1];
    if signed && first_mapped > i64::from(i16::MAX) {
        first_mapped -= 65536;
    }

    Attribute::Present(VoiLut {
        first_mapped: first_mapped as f64,
        data: data.into_iter().map(|v| v as f64).collect(),
    })
}

fn read_voi_lut_function(obj: &InMemDicomObject) -> VoiLutFunction {
    match str_attr(obj, tags::VOILUT_FUNCTION).as_deref() {
        Some("LINEAR_EXACT") => VoiLutFunction::LinearExact,
        Some("SIGMOID") => VoiLutFunction::Sigmoid,
        _ => VoiLutFunction::Linear,
    }
}

/// Converts raw native-endian pixel bytes into a floating point sample array.
fn decode_samples(data: &[u8], layout: &PixelLayout) -> std::result::Result<ArrayD<f64>, String> {
    if !layout.is_supported() {
        return Err(format!("unsupported BitsAllocated {}", layout.bits_allocated));
    }
    let bytes_per_sample = layout.bytes_per_sample();

    let needed = layout
        .sample_count()
        .and_then(|count| count.checked_mul(bytes_per_sample))
        .ok_or_else(|| format!("pixel layout {:?} is too large", layout))?;
    if data.len() < needed {
        return Err(format!(
            "pixel data holds {} bytes, expected {}",
            data.len(),
            needed
        ));
    }

    let values: Vec<f64> = data[..needed]
        .chunks_exact(bytes_per_sample)
        .map(|chunk| read_sample(chunk, layout))
        .collect();

    let array = if layout.planar && layout.samples_per_pixel > 1 {
        // planar data is frame × channel × row × column on the wire
        let planar_shape = [layout.frames, layout.samples_per_pixel, layout.rows, layout.columns];
        let planar = ArrayD::from_shape_vec(IxDyn(&planar_shape), values)
            .map_err(|e| e.to_string())?;
        let interleaved = planar.permuted_axes(IxDyn(&[0, 2, 3, 1]));
        interleaved
            .as_standard_layout()
            .into_owned()
            .into_shape_with_order(IxDyn(&layout.shape()))
            .map_err(|e| e.to_string())?
    } else {
        ArrayD::from_shape_vec(IxDyn(&layout.shape()), values).map_err(|e| e.to_string())?
    };

    Ok(array)
}

fn read_sample(chunk: &[u8], layout: &PixelLayout) -> f64 {
    let raw: u32 = match chunk.len() {
        1 => u32::from(chunk[0]),
        2 => u32::from(u16::from_ne_bytes([chunk[0], chunk[1]])),
        _ => u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
    };
    if !layout.signed {
        return f64::from(raw);
    }
    // sign-extend from the stored bit depth
    let bits = u32::from(layout.bits_stored.clamp(1, layout.bits_allocated));
    let shift = 32 - bits;
    f64::from(((raw << shift) as i32) >> shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(bits_allocated: u16, bits_stored: u16, signed: bool) -> PixelLayout {
        PixelLayout {
            rows: 2,
            columns: 2,
            frames: 1,
            samples_per_pixel: 1,
            bits_allocated,
            bits_stored,
            signed,
            planar: false,
        }
    }

    #[test]
    fn decodes_unsigned_16_bit_samples() {
        let values: [u16; 4] = [0, 1, 4095, 65535];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let array = decode_samples(&bytes, &layout(16, 16, false)).unwrap();
        assert_eq!(array.shape(), &[2, 2]);
        assert_eq!(array.iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0, 4095.0, 65535.0]);
    }

    #[test]
    fn sign_extends_from_bits_stored() {
        // 12-bit two's complement -1 and -2048 stored in 16-bit words
        let values: [u16; 4] = [0x0FFF, 0x0800, 0x07FF, 0x0001];
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let array = decode_samples(&bytes, &layout(16, 12, true)).unwrap();
        assert_eq!(array.iter().copied().collect::<Vec<_>>(), vec![-1.0, -2048.0, 2047.0, 1.0]);
    }

    #[test]
    fn rejects_truncated_payload() {
        let err = decode_samples(&[0u8; 6], &layout(16, 16, false)).unwrap_err();
        assert!(err.contains("expected 8"));
    }

    #[test]
    fn rejects_bit_packed_samples() {
        assert!(decode_samples(&[0u8; 8], &layout(1, 1, false)).is_err());
    }

    #[test]
    fn only_whole_byte_widths_are_supported() {
        for bits in [8, 16, 32] {
            assert!(layout(bits, bits, false).is_supported());
        }
        for bits in [1, 12, 24] {
            assert!(!layout(bits, bits, false).is_supported());
        }
    }

    #[test]
    fn oversized_frame_count_is_rejected() {
        let layout = PixelLayout {
            frames: usize::MAX / 2,
            ..layout(16, 16, false)
        };
        let err = decode_samples(&[0u8; 8], &layout).unwrap_err();
        assert!(err.contains("too large"));
    }

    #[test]
    fn reinterleaves_planar_color() {
        let layout = PixelLayout {
            samples_per_pixel: 3,
            planar: true,
            ..layout(8, 8, false)
        };
        // R plane, G plane, B plane
        let bytes = [1u8, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3];
        let array = decode_samples(&bytes, &layout).unwrap();
        assert_eq!(array.shape(), &[2, 2, 3]);
        assert_eq!(
            array.iter().copied().collect::<Vec<_>>()[..6],
            [1.0, 2.0, 3.0, 1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn multi_frame_shape_has_frame_axis() {
        let layout = PixelLayout {
            frames: 3,
            ..layout(8, 8, false)
        };
        let array = decode_samples(&[0u8; 12], &layout).unwrap();
        assert_eq!(array.shape(), &[3, 2, 2]);
    }
}
