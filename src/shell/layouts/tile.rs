// SPDX-License-Identifier: GPL-3.0-only

//! Classic master/stack tiling, generalized from the column-stacking code
//! this core has always used for its two-column case.

use crate::shell::layout::{Layout, LayoutRequest};
use smithay::utils::{Logical, Point, Rectangle, Size};

pub struct Tile;

impl Layout for Tile {
    fn name(&self) -> &'static str {
        "tile"
    }

    fn symbol(&self) -> &'static str {
        "[#]"
    }

    fn arrange(&self, req: &mut LayoutRequest) {
        let count = req.clients.len();
        if count == 0 {
            return;
        }

        let area = req.area;
        let gaps = req.gaps;
        let nmaster = (req.nmaster.max(0) as usize).min(count);
        let stack_count = count - nmaster;

        let usable = Rectangle::new(
            Point::from((area.loc.x + gaps.outer_h, area.loc.y + gaps.outer_v)),
            Size::from((area.size.w - 2 * gaps.outer_h, area.size.h - 2 * gaps.outer_v)),
        );

        if stack_count == 0 {
            let rects = stack_column(count, usable, gaps.inner_v);
            for (i, rect) in rects.into_iter().enumerate() {
                req.clients[i].rect = rect;
            }
            return;
        }

        let master_w = (usable.size.w as f32 * req.master_factor) as i32;
        let half = gaps.inner_h / 2;
        let master_area = Rectangle::new(
            usable.loc,
            Size::from((master_w - half, usable.size.h)),
        );
        let stack_area = Rectangle::new(
            Point::from((usable.loc.x + master_w + gaps.inner_h - half, usable.loc.y)),
            Size::from((usable.size.w - master_w - gaps.inner_h + half, usable.size.h)),
        );

        let master_rects = stack_column(nmaster, master_area, gaps.inner_v);
        let stack_rects = stack_column(stack_count, stack_area, gaps.inner_v);

        for (i, rect) in master_rects.into_iter().chain(stack_rects).enumerate() {
            req.clients[i].rect = rect;
        }
    }
}

/// Divides `area`'s height evenly among `count` vertically stacked slots,
/// separated by `gap`; the last slot absorbs any remainder pixel.
fn stack_column(count: usize, area: Rectangle<i32, Logical>, gap: i32) -> Vec<Rectangle<i32, Logical>> {
    if count == 0 {
        return vec![];
    }
    let gap_total = gap * (count as i32 - 1);
    let available = area.size.h - gap_total;
    let h = available / count as i32;
    let remainder = available - h * count as i32;

    let mut rects = Vec::with_capacity(count);
    let mut y = area.loc.y;
    for i in 0..count {
        let this_h = if i == count - 1 { h + remainder } else { h };
        rects.push(Rectangle::new(Point::from((area.loc.x, y)), Size::from((area.size.w, this_h))));
        y += this_h + gap;
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::layout::{Gaps, LayoutClient};

    fn area() -> Rectangle<i32, Logical> {
        Rectangle::new(Point::from((0, 0)), Size::from((1920, 1080)))
    }

    #[test]
    fn single_master_fills_full_width_when_no_stack() {
        let mut clients = vec![LayoutClient { rect: Rectangle::from_size(Size::from((0, 0))), column_ratio: 0.0 }];
        let mut req = LayoutRequest {
            area: area(),
            gaps: Gaps::default(),
            master_factor: 0.5,
            nmaster: 1,
            focused_index: Some(0),
            clients: &mut clients,
        };
        Tile.arrange(&mut req);
        assert_eq!(clients[0].rect.size.w, 1920);
    }

    #[test]
    fn stack_remainder_goes_to_last_slot() {
        let column = stack_column(3, Rectangle::new(Point::from((0, 0)), Size::from((100, 100))), 0);
        let total: i32 = column.iter().map(|r| r.size.h).sum();
        assert_eq!(total, 100);
        assert!(column[2].size.h >= column[0].size.h);
    }

    #[test]
    fn master_and_stack_columns_are_disjoint() {
        let mut clients = vec![
            LayoutClient { rect: Rectangle::from_size(Size::from((0, 0))), column_ratio: 0.0 },
            LayoutClient { rect: Rectangle::from_size(Size::from((0, 0))), column_ratio: 0.0 },
            LayoutClient { rect: Rectangle::from_size(Size::from((0, 0))), column_ratio: 0.0 },
        ];
        let mut req = LayoutRequest {
            area: area(),
            gaps: Gaps::default(),
            master_factor: 0.5,
            nmaster: 1,
            focused_index: Some(0),
            clients: &mut clients,
        };
        Tile.arrange(&mut req);
        assert!(clients[0].rect.loc.x < clients[1].rect.loc.x);
        assert_eq!(clients[1].rect.loc.x, clients[2].rect.loc.x);
        assert!(clients[1].rect.loc.y < clients[2].rect.loc.y);
    }
}
