use super::{ApplyContext, ApplyTable};
use crate::tables::trak;

impl ApplyTable for trak::Table<'_> {
    fn has_data(&self) -> bool {
        trak::Table::has_data(self)
    }

    fn apply(&self, c: &mut ApplyContext) -> Option<()> {
        let ptem = c.font.points_per_em()?;
        if ptem <= 0.0 {
            return None;
        }

        let trak_mask = c.plan.trak_mask;
        let horizontal = c.buffer.direction.is_horizontal();
        let tracking = if horizontal {
            self.hor_tracking(ptem)?
        } else {
            self.ver_tracking(ptem)?
        };

        // The offset is scaled from the unscaled half.
        let (advance_to_add, offset_to_add) = if horizontal {
            (c.font.em_scalef_x(tracking), c.font.em_scalef_x(tracking / 2.0))
        } else {
            (c.font.em_scalef_y(tracking), c.font.em_scalef_y(tracking / 2.0))
        };

        // Tracking goes to the first glyph of each grapheme.
        let buffer = &mut *c.buffer;
        let mut start = 0;
        while start < buffer.len {
            let end = buffer.next_grapheme(start);
            if buffer.info[start].mask & trak_mask != 0 {
                let pos = &mut buffer.pos[start];
                if horizontal {
                    pos.x_advance += advance_to_add;
                    pos.x_offset += offset_to_add;
                } else {
                    pos.y_advance += advance_to_add;
                    pos.y_offset += offset_to_add;
                }
            }

            start = end;
        }

        Some(())
    }
}
