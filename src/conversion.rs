use log::warn;
use std::io;

use crate::dataset::{ClassMap, DEFAULT_CLASS_INDEX};
use crate::rle;
use crate::types::{BoundingBox, MaskRecord, RleMask};

/// Convert an RLE mask to a normalized YOLO bounding box.
///
/// The box is the tight inclusive bound over foreground pixels, normalized by
/// the size declared on the mask. A mask with no foreground yields the all-zero box.
pub fn mask_to_bbox(rle_mask: &RleMask) -> io::Result<BoundingBox> {
    let mask = rle::decode(rle_mask)?;

    let bounds = mask.foreground().fold(
        None,
        |bounds: Option<(usize, usize, usize, usize)>, (row, col)| match bounds {
            None => Some((row, row, col, col)),
            Some((min_row, max_row, min_col, max_col)) => Some((
                min_row.min(row),
                max_row.max(row),
                min_col.min(col),
                max_col.max(col),
            )),
        },
    );

    let Some((min_row, max_row, min_col, max_col)) = bounds else {
        return Ok(BoundingBox::default());
    };

    let img_height = rle_mask.height() as f64;
    let img_width = rle_mask.width() as f64;

    let bbox_width = (max_col - min_col + 1) as f64;
    let bbox_height = (max_row - min_row + 1) as f64;

    Ok(BoundingBox {
        center_x: (min_col as f64 + bbox_width / 2.0) / img_width,
        center_y: (min_row as f64 + bbox_height / 2.0) / img_height,
        width: bbox_width / img_width,
        height: bbox_height / img_height,
    })
}

/// Format one YOLO label line
pub fn format_yolo_line(class_index: usize, bbox: &BoundingBox) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        class_index, bbox.center_x, bbox.center_y, bbox.width, bbox.height
    )
}

/// Build the label file contents for one frame.
///
/// Lines follow the record order of the frame. Objects whose box has zero
/// width or height are left out, so a frame may produce an empty string.
pub fn create_yolo_annotation(
    frame_index: u32,
    object_results: &[MaskRecord],
    class_map: &ClassMap,
) -> io::Result<String> {
    let mut lines = Vec::with_capacity(object_results.len());

    for record in object_results {
        let class_index = match class_map.class_index(record.object_id) {
            Some(class_index) => class_index,
            None => {
                warn!(
                    "Object {} in frame {} has no class index, using {}",
                    record.object_id, frame_index, DEFAULT_CLASS_INDEX
                );
                DEFAULT_CLASS_INDEX
            }
        };

        let bbox = mask_to_bbox(&record.mask)?;
        if bbox.is_degenerate() {
            continue;
        }

        lines.push(format_yolo_line(class_index, &bbox));
    }

    Ok(lines.join("\n"))
}
