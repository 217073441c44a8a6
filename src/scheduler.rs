use crate::BulkConfig;

/// How the whole frames of one push are split.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct BulkPlan {
    /// Leading frames whose embeddings are computed in one batch, without classification.
    pub head_frames: usize,
    /// Frames processed and classified one at a time.
    pub tail_frames: usize,
    /// Samples left after the last whole frame.
    pub remainder: usize,
}

/// The whole frames of one push, the first one possibly completed from the carry.
pub(crate) struct PushFrames<'a> {
    merged: Option<Vec<i16>>,
    carried: usize,
    rest: &'a [i16],
    frame_length: usize,
    plan: BulkPlan,
}
impl<'a> PushFrames<'a> {
    pub fn len(&self) -> usize {
        self.plan.head_frames + self.plan.tail_frames
    }
    pub fn get_plan(&self) -> BulkPlan {
        self.plan
    }
    pub fn frame(&self, index: usize) -> &[i16] {
        match (&self.merged, index) {
            (Some(merged), 0) => &merged[..],
            (Some(_), _) => self.rest_frame(index - 1),
            (None, _) => self.rest_frame(index),
        }
    }
    /// Samples the first frame took from the carry.
    pub fn carried(&self) -> &[i16] {
        match &self.merged {
            Some(merged) => &merged[..self.carried],
            None => &[],
        }
    }
    pub fn remainder(&self) -> &'a [i16] {
        &self.rest[self.rest.len() - self.plan.remainder..]
    }
    fn rest_frame(&self, index: usize) -> &[i16] {
        &self.rest[index * self.frame_length..(index + 1) * self.frame_length]
    }
}

/// Splits pushes into whole frames, keeping sub-frame leftovers between pushes.
pub(crate) struct IngestionScheduler {
    frame_length: usize,
    bulk: BulkConfig,
    carry: Vec<i16>,
}
impl IngestionScheduler {
    pub fn new(frame_length: usize, bulk: BulkConfig) -> IngestionScheduler {
        IngestionScheduler {
            frame_length,
            bulk: bulk.clamped(frame_length),
            carry: Vec::with_capacity(frame_length),
        }
    }
    pub fn configure(&mut self, bulk: BulkConfig) {
        self.bulk = bulk.clamped(self.frame_length);
    }
    pub fn get_bulk_config(&self) -> BulkConfig {
        self.bulk
    }
    /// Consumes the carry. Returns `None` when the push doesn't complete a frame, its samples
    /// are kept in the carry in that case.
    pub fn split<'a>(&mut self, chunk: &'a [i16]) -> Option<PushFrames<'a>> {
        let carried = self.carry.len();
        let total = carried + chunk.len();
        if total < self.frame_length {
            self.carry.extend_from_slice(chunk);
            return None;
        }
        let (merged, rest) = if carried > 0 {
            let needed = self.frame_length - carried;
            let mut merged = std::mem::take(&mut self.carry);
            merged.extend_from_slice(&chunk[..needed]);
            (Some(merged), &chunk[needed..])
        } else {
            (None, chunk)
        };
        Some(PushFrames {
            merged,
            carried,
            rest,
            frame_length: self.frame_length,
            plan: self.plan(total),
        })
    }
    pub fn plan(&self, total_samples: usize) -> BulkPlan {
        let whole_frames = total_samples / self.frame_length;
        let remainder = total_samples % self.frame_length;
        let head_frames = if self.bulk.enabled && total_samples >= self.bulk.min_samples {
            let head_frames = (total_samples as f64 * self.bulk.ratio as f64
                / self.frame_length as f64)
                .floor() as usize;
            // keep at least one classified frame
            head_frames.min(whole_frames.saturating_sub(1))
        } else {
            0
        };
        BulkPlan {
            head_frames,
            tail_frames: whole_frames - head_frames,
            remainder,
        }
    }
    pub fn store_carry(&mut self, remainder: &[i16]) {
        self.carry.clear();
        self.carry.extend_from_slice(remainder);
    }
    pub fn clear_carry(&mut self) {
        self.carry.clear();
    }
    pub fn get_carry_len(&self) -> usize {
        self.carry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{BulkPlan, IngestionScheduler};
    use crate::BulkConfig;

    fn new_scheduler(enabled: bool) -> IngestionScheduler {
        IngestionScheduler::new(
            1280,
            BulkConfig {
                enabled,
                ratio: 0.8,
                min_samples: 5000,
            },
        )
    }

    fn collect_frames(scheduler: &mut IngestionScheduler, chunk: &[i16]) -> Vec<Vec<i16>> {
        match scheduler.split(chunk) {
            Some(frames) => {
                let collected = (0..frames.len())
                    .map(|index| frames.frame(index).to_vec())
                    .collect();
                scheduler.store_carry(frames.remainder());
                collected
            }
            None => Vec::new(),
        }
    }

    #[test]
    fn it_plans_head_and_tail_frames() {
        let scheduler = new_scheduler(true);
        assert_eq!(
            scheduler.plan(64000),
            BulkPlan {
                head_frames: 40,
                tail_frames: 10,
                remainder: 0
            }
        );
        // under min samples everything is tail
        assert_eq!(
            scheduler.plan(4000),
            BulkPlan {
                head_frames: 0,
                tail_frames: 3,
                remainder: 160
            }
        );
        let scheduler = new_scheduler(false);
        assert_eq!(scheduler.plan(64000).head_frames, 0);
    }

    #[test]
    fn it_keeps_one_tail_frame_with_max_ratio() {
        let mut scheduler = new_scheduler(true);
        scheduler.configure(BulkConfig {
            enabled: true,
            ratio: 5.,
            min_samples: 0,
        });
        assert_eq!(scheduler.get_bulk_config().min_samples, 2560);
        let plan = scheduler.plan(2560);
        assert_eq!(plan.head_frames, 1);
        assert_eq!(plan.tail_frames, 1);
        let plan = scheduler.plan(128000);
        assert_eq!(plan.head_frames, 99);
        assert_eq!(plan.tail_frames, 1);
    }

    #[test]
    fn it_carries_partial_frames_between_pushes() {
        let samples: Vec<i16> = (0..6000).map(|i| i as i16).collect();
        let expected = samples
            .chunks_exact(1280)
            .map(|frame| frame.to_vec())
            .collect::<Vec<_>>();
        for split_sizes in [vec![1000, 3000, 2000], vec![1, 1279, 4720], vec![700; 9]] {
            let mut scheduler = new_scheduler(true);
            let mut frames = Vec::new();
            let mut offset = 0;
            for size in split_sizes {
                let end = (offset + size).min(samples.len());
                frames.extend(collect_frames(&mut scheduler, &samples[offset..end]));
                offset = end;
            }
            frames.extend(collect_frames(&mut scheduler, &samples[offset..]));
            assert_eq!(frames, expected);
            assert_eq!(scheduler.get_carry_len(), 6000 % 1280);
        }
    }

    #[test]
    fn it_exposes_the_carried_samples_of_the_merged_frame() {
        let mut scheduler = new_scheduler(false);
        assert!(scheduler.split(&[7; 1000]).is_none());
        assert_eq!(scheduler.get_carry_len(), 1000);
        let chunk = vec![1; 3000];
        let frames = scheduler.split(&chunk).unwrap();
        assert_eq!(scheduler.get_carry_len(), 0);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames.carried(), &[7; 1000][..]);
        assert_eq!(frames.frame(0)[999], 7);
        assert_eq!(frames.frame(0)[1000], 1);
        assert_eq!(frames.remainder().len(), 160);
    }
}
