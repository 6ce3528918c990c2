use crate::treewalk::{types::Exception, DomainResult};

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Range {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl Range {
    pub fn new(start: i64, stop: i64, step: i64) -> DomainResult<Self> {
        if step == 0 {
            return Err(Exception::value_error("range() arg 3 must not be zero"));
        }
        Ok(Self { start, stop, step })
    }

    pub fn len(&self) -> usize {
        let span = if self.step > 0 {
            self.stop - self.start
        } else {
            self.start - self.stop
        };
        if span <= 0 {
            return 0;
        }
        let step = self.step.unsigned_abs() as i64;
        ((span + step - 1) / step) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        (index < self.len()).then(|| self.start + self.step * index as i64)
    }

    pub fn contains(&self, value: i64) -> bool {
        let in_bounds = if self.step > 0 {
            value >= self.start && value < self.stop
        } else {
            value <= self.start && value > self.stop
        };
        in_bounds && (value - self.start) % self.step == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> {
        let range = *self;
        (0..range.len()).map(move |i| range.start + range.step * i as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths() {
        assert_eq!(Range::new(0, 5, 1).unwrap().len(), 5);
        assert_eq!(Range::new(0, 5, 2).unwrap().len(), 3);
        assert_eq!(Range::new(5, 0, -2).unwrap().len(), 3);
        assert_eq!(Range::new(5, 0, 1).unwrap().len(), 0);
    }

    #[test]
    fn values() {
        let range = Range::new(10, 0, -3).unwrap();
        assert_eq!(range.iter().collect::<Vec<_>>(), vec![10, 7, 4, 1]);
        assert!(range.contains(4));
        assert!(!range.contains(5));
        assert_eq!(range.get(3), Some(1));
        assert_eq!(range.get(4), None);
    }

    #[test]
    fn zero_step() {
        let e = Range::new(0, 1, 0).unwrap_err();
        assert_eq!(e.message(), "range() arg 3 must not be zero");
    }
}
