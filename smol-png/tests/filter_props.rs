mod common;

use common::{build_png, ihdr, sub_filter, with_filter_bytes};
use proptest::prelude::*;
use smol_png::scanline::{FilterType, ScanlineLayout, reconstruct, unfilter_row};
use smol_png::{decode, parse};

proptest! {
    #[test]
    fn sub_round_trip_any_row_length(row in proptest::collection::vec(any::<u8>(), 1..512)) {
        let mut data = vec![FilterType::Sub as u8];
        data.extend(sub_filter(&row, 1));
        let layout = ScanlineLayout {
            width: row.len() as u32,
            height: 1,
            channels: 1,
            bit_depth: 8,
        };
        prop_assert_eq!(reconstruct(&data, layout).unwrap(), row);
    }

    #[test]
    fn sub_round_trip_any_stride(
        row in proptest::collection::vec(any::<u8>(), 1..256),
        bpp in 1usize..=8,
    ) {
        let mut filtered = sub_filter(&row, bpp);
        let prev = vec![0u8; row.len()];
        unfilter_row(FilterType::Sub, &mut filtered, &prev, bpp);
        prop_assert_eq!(filtered, row);
    }

    #[test]
    fn grid_length_matches_dimensions(
        width in 1u32..12,
        height in 1u32..12,
        colour in prop::sample::select(vec![0u8, 2, 4, 6]),
        parts in 1usize..5,
        seed in any::<u8>(),
    ) {
        let channels = match colour { 0 => 1, 2 => 3, 4 => 2, _ => 4 };
        let row_bytes = width as usize * channels;
        let raw: Vec<u8> = (0..row_bytes * height as usize)
            .map(|i| (i as u8).wrapping_mul(seed).wrapping_add(7))
            .collect();
        let png = build_png(&ihdr(width, height, 8, colour), None, &with_filter_bytes(&raw, row_bytes, 0), parts);

        prop_assert_eq!(parse(&png).unwrap(), parse(&png).unwrap());
        let img = decode(&png).unwrap();
        prop_assert_eq!(img.data.len(), (width * height) as usize * channels);
        prop_assert_eq!(img.data, raw);
    }
}
