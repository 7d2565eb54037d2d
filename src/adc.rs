/// 本地定义的阻塞式ADC读取trait。
///
/// embedded-hal 1.0 没有ADC抽象，因此由使用者为具体的HAL通道实现它。
/// 读数应位于 `[0, ADC满量程)` 之间。
pub trait AnalogInput {
    type Error;
    fn read(&mut self) -> Result<u16, Self::Error>;
}

/// ADC采样滤波器的trait。
pub trait AdcFilter {
    /// 处理一个新的采样值。
    /// 如果滤波器已准备好输出一个有效值，则返回 `Some(value)`。
    /// 否则返回 `None`，表示需要更多样本。
    fn process(&mut self, new_sample: u16) -> Option<u16>;

    /// 丢弃已采集但尚未输出的样本。
    fn reset(&mut self) {}
}

pub mod filter {
    use super::*;

    /// 原始值滤波器，每个样本直接输出。
    #[derive(Debug, Default)]
    pub struct RawFilter;

    impl AdcFilter for RawFilter {
        fn process(&mut self, new_sample: u16) -> Option<u16> {
            Some(new_sample)
        }
    }

    /// 均值滤波器，采满 `N` 个样本后输出整数截断的平均值。
    #[derive(Debug)]
    pub struct AverageFilter<const N: usize> {
        sum: u32,
        count: usize,
    }

    impl<const N: usize> AverageFilter<N> {
        pub const fn new() -> Self {
            assert!(N > 0, "AverageFilter requires at least 1 sample");
            Self { sum: 0, count: 0 }
        }
    }

    impl<const N: usize> Default for AverageFilter<N> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<const N: usize> AdcFilter for AverageFilter<N> {
        fn process(&mut self, new_sample: u16) -> Option<u16> {
            self.sum += u32::from(new_sample);
            self.count += 1;

            if self.count < N {
                return None;
            }

            let average = self.sum / N as u32;
            self.reset();
            Some(average as u16)
        }

        fn reset(&mut self) {
            self.sum = 0;
            self.count = 0;
        }
    }

    /// 中位值滤波器，采满 `N` 个样本后输出中位数，用于剔除偶发的尖峰读数。
    ///
    /// 样本缓冲区保持采集顺序，求中位数在副本上进行。
    #[derive(Debug)]
    pub struct MedianFilter<const N: usize> {
        window: [u16; N],
        filled: usize,
    }

    impl<const N: usize> MedianFilter<N> {
        pub const fn new() -> Self {
            assert!(N > 0, "MedianFilter requires at least 1 sample");
            Self {
                window: [0; N],
                filled: 0,
            }
        }
    }

    impl<const N: usize> Default for MedianFilter<N> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<const N: usize> AdcFilter for MedianFilter<N> {
        fn process(&mut self, new_sample: u16) -> Option<u16> {
            self.window[self.filled] = new_sample;
            self.filled += 1;

            if self.filled < N {
                return None;
            }

            let mut ordered = self.window;
            let (_, median, _) = ordered.select_nth_unstable(N / 2);
            let median = *median;
            self.reset();
            Some(median)
        }

        fn reset(&mut self) {
            self.filled = 0;
        }
    }
}
