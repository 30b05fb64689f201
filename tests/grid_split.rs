use bench_image_reorg::grid::{GridShape, split_grid};
use image::{GenericImageView, Rgb, RgbImage};

fn quadrant_image(path: &std::path::Path, w: u32, h: u32, black: &[usize]) {
    let colors = [[200, 40, 40], [40, 200, 40], [40, 40, 200], [220, 220, 220]];
    let mut img = RgbImage::new(w, h);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let q = usize::from(y >= h / 2) * 2 + usize::from(x >= w / 2);
        *px = if black.contains(&q) { Rgb([0, 0, 0]) } else { Rgb(colors[q]) };
    }
    img.save(path).expect("write grid");
}

#[test]
fn black_quadrant_is_dropped_and_numbering_stays_contiguous() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let grid = tmp.path().join("grid.png");
    quadrant_image(&grid, 4, 4, &[0]);
    let scratch = tmp.path().join("cache");

    let written = split_grid(&grid, GridShape::default(), &scratch).expect("split");

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["0.jpg", "1.jpg", "2.jpg"]);
    assert_eq!(std::fs::read_dir(&scratch).expect("ls").count(), 3);
    for path in &written {
        assert_eq!(image::open(path).expect("tile").dimensions(), (2, 2));
    }
}

#[test]
fn odd_dimensions_truncate_tiles() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let grid = tmp.path().join("grid.png");
    quadrant_image(&grid, 101, 67, &[]);

    let written =
        split_grid(&grid, GridShape::default(), &tmp.path().join("cache")).expect("split");

    assert_eq!(written.len(), 4);
    for path in &written {
        assert_eq!(image::open(path).expect("tile").dimensions(), (50, 33));
    }
}

#[test]
fn all_black_grid_writes_nothing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let grid = tmp.path().join("grid.png");
    quadrant_image(&grid, 8, 8, &[0, 1, 2, 3]);

    let written =
        split_grid(&grid, GridShape::default(), &tmp.path().join("cache")).expect("split");
    assert!(written.is_empty());
}
