use crate::treewalk::{types::Exception, DomainResult};

#[derive(Debug, PartialEq, Clone)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    pub fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// The indices this slice selects from a sequence of length `len`, in selection order.
    pub fn indices(&self, len: usize) -> DomainResult<Vec<usize>> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(Exception::value_error("slice step cannot be zero"));
        }

        let len = len as i64;
        let adjust = |index: i64, lower: i64, upper: i64| {
            let index = if index < 0 { index + len } else { index };
            index.clamp(lower, upper)
        };

        let mut indices = vec![];
        if step > 0 {
            let start = self.start.map_or(0, |i| adjust(i, 0, len));
            let stop = self.stop.map_or(len, |i| adjust(i, 0, len));
            let mut i = start;
            while i < stop {
                indices.push(i as usize);
                i += step;
            }
        } else {
            let start = self.start.map_or(len - 1, |i| adjust(i, -1, len - 1));
            let stop = self.stop.map_or(-1, |i| adjust(i, -1, len - 1));
            let mut i = start;
            while i > stop {
                indices.push(i as usize);
                i += step;
            }
        }
        Ok(indices)
    }

    /// The half-open `[start, end)` window of a step-one slice, clamped to `len`. This is how
    /// the optional `start`/`end` arguments of `str.find` and `list.index` are interpreted.
    pub fn bounds(&self, len: usize) -> (usize, usize) {
        let len = len as i64;
        let adjust = |index: i64| {
            let index = if index < 0 { index + len } else { index };
            index.clamp(0, len) as usize
        };
        let start = self.start.map_or(0, adjust);
        let stop = self.stop.map_or(len as usize, adjust);
        (start, stop.max(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward() {
        let slice = Slice::new(Some(1), Some(-1), None);
        assert_eq!(slice.indices(5).unwrap(), vec![1, 2, 3]);
        assert_eq!(Slice::new(None, None, Some(2)).indices(5).unwrap(), vec![0, 2, 4]);
        assert_eq!(Slice::new(Some(10), None, None).indices(3).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn backward() {
        let slice = Slice::new(None, None, Some(-1));
        assert_eq!(slice.indices(3).unwrap(), vec![2, 1, 0]);
        assert_eq!(Slice::new(Some(-2), Some(0), Some(-1)).indices(4).unwrap(), vec![2, 1]);
    }

    #[test]
    fn bounds() {
        assert_eq!(Slice::new(None, None, None).bounds(4), (0, 4));
        assert_eq!(Slice::new(Some(-2), None, None).bounds(4), (2, 4));
        assert_eq!(Slice::new(Some(3), Some(1), None).bounds(4), (3, 3));
    }

    #[test]
    fn zero_step() {
        let e = Slice::new(None, None, Some(0)).indices(3).unwrap_err();
        assert_eq!(e.message(), "slice step cannot be zero");
    }
}
