use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tiff::encoder::{TiffEncoder, colortype};
use tracing::info;

use super::{OutputError, Pigment, PigmentProduct};

/// Page order of the exported TIFF.
pub const PAGES: [&str; 6] = ["chla", "chlb", "chlc", "ppc", "latitude", "longitude"];

/// Writes the product as a multi-page 32-bit float TIFF: one page per
/// pigment followed by latitude and longitude. Missing cells stay NaN.
pub fn write_tiff<P: AsRef<Path>>(product: &PigmentProduct, path: P) -> Result<(), OutputError> {
    let (lines, pixels) = product.pigments().shape();
    let (width, height) = match (u32::try_from(pixels), u32::try_from(lines)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(OutputError::TooLarge { lines, pixels }),
    };

    let file = File::create(path.as_ref())?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;

    let mut layers: Vec<Vec<f32>> = Pigment::ALL
        .iter()
        .map(|&p| product.field(p).iter().map(|&v| v as f32).collect())
        .collect();
    layers.push(product.latitude().iter().map(|&v| v as f32).collect());
    layers.push(product.longitude().iter().map(|&v| v as f32).collect());

    for data in &layers {
        encoder.write_image::<colortype::Gray32Float>(width, height, data)?;
    }

    info!(
        path = %path.as_ref().display(),
        pages = PAGES.len(),
        width,
        height,
        "pigment product written"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BoundingBox;
    use crate::inversion::Pigments;
    use crate::output::PigmentGrid;
    use crate::swath::SwathSubset;
    use crate::swath::tests::regular_swath;
    use std::io::BufReader;
    use tempfile::tempdir;
    use tiff::decoder::{Decoder, DecodingResult};

    #[test]
    fn test_write_tiff_pages() {
        let swath = regular_swath(4, 4);
        let bbox = BoundingBox::new(2.5, 0.5, 3.5, 0.5).unwrap();
        let subset = SwathSubset::extract(&swath, &bbox).unwrap();
        assert_eq!(subset.shape(), (2, 3));

        let mut grid = PigmentGrid::allocate(subset.shape());
        grid.set((0, 1), Pigments::from([1.5, 2.5, 3.5, 4.5]));
        let product = PigmentProduct::new(subset, grid);

        let dir = tempdir().unwrap();
        let path = dir.path().join("pigments.tif");
        write_tiff(&product, &path).unwrap();

        let file = File::open(&path).unwrap();
        let mut decoder = Decoder::new(BufReader::new(file)).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (3, 2));

        let mut pages = Vec::new();
        loop {
            match decoder.read_image().unwrap() {
                DecodingResult::F32(data) => pages.push(data),
                _ => panic!("unexpected sample format"),
            }
            if !decoder.more_images() {
                break;
            }
            decoder.next_image().unwrap();
        }

        assert_eq!(pages.len(), PAGES.len());
        assert_eq!(pages[0][1], 1.5);
        assert_eq!(pages[3][1], 4.5);
        assert!(pages[0][0].is_nan());
        // latitude of subset row 1 is swath line 2
        assert_eq!(pages[4][3], 2.0);
        assert_eq!(pages[5][2], 3.0);
    }
}
