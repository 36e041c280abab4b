// SPDX-License-Identifier: GPL-3.0-only

//! The primary tiling model: clients are columns on an infinite horizontal
//! strip, recentered on the focused column each arrange.

use crate::shell::layout::{Layout, LayoutRequest};
use smithay::utils::{Logical, Point, Rectangle, Size};

pub struct Scroller;

impl Layout for Scroller {
    fn name(&self) -> &'static str {
        "scroller"
    }

    fn symbol(&self) -> &'static str {
        "[~]"
    }

    fn arrange(&self, req: &mut LayoutRequest) {
        let count = req.clients.len();
        if count == 0 {
            return;
        }

        let area = req.area;
        let inner_h = req.gaps.inner_h;
        let outer_h = req.gaps.outer_h;
        let outer_v = req.gaps.outer_v;

        let col_w: Vec<i32> = req
            .clients
            .iter()
            .map(|c| {
                let ratio = if c.column_ratio > 0.0 {
                    c.column_ratio
                } else {
                    req.master_factor
                };
                (area.size.w as f32 * ratio).round() as i32
            })
            .collect();

        let mut acc_x = vec![0i32; count];
        for i in 1..count {
            acc_x[i] = acc_x[i - 1] + col_w[i - 1];
        }

        let focused = req.focused_index.unwrap_or(0).min(count - 1);
        let area_center_x = area.loc.x + area.size.w / 2;
        let offset = area_center_x - (acc_x[focused] + col_w[focused] / 2);

        for i in 0..count {
            let x = offset + acc_x[i] + outer_h;
            let y = area.loc.y + outer_v;
            let w = col_w[i] - inner_h;
            let h = area.size.h - 2 * outer_v;
            req.clients[i].rect = Rectangle::new(Point::from((x, y)), Size::from((w, h)));
        }
    }

    fn focus_next(&self, count: usize, current: usize, direction: i32) -> Option<usize> {
        if count == 0 {
            return None;
        }
        let len = count as i32;
        Some((current as i32 + direction).rem_euclid(len) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::layout::{Gaps, LayoutClient};

    fn area() -> Rectangle<i32, Logical> {
        Rectangle::new(Point::from((0, 0)), Size::from((1920, 1080)))
    }

    #[test]
    fn three_equal_columns_center_the_focused_one() {
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
            focused_index: Some(1),
            clients: &mut clients,
        };
        Scroller.arrange(&mut req);

        assert!(clients[0].rect.loc.x < clients[1].rect.loc.x);
        assert!(clients[1].rect.loc.x < clients[2].rect.loc.x);
        assert_eq!(clients[0].rect.size.w, clients[1].rect.size.w);

        let center = clients[1].rect.loc.x + clients[1].rect.size.w / 2;
        assert!((center - 960).abs() <= 1);
    }

    #[test]
    fn focus_next_wraps_in_both_directions() {
        assert_eq!(Scroller.focus_next(3, 2, 1), Some(0));
        assert_eq!(Scroller.focus_next(3, 0, -1), Some(2));
    }
}
