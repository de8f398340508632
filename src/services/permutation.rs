//! 随机排列 - 业务能力层
//!
//! Fisher-Yates 洗牌：每种排列出现的概率相同，O(n) 时间。
//! 随机源由调用方注入，生产环境用系统熵播种，测试用固定种子。

use rand::Rng;

/// 返回打乱后的新序列，输入不被修改
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffle_in_place(&mut shuffled, rng);
    shuffled
}

/// 原地打乱
pub fn shuffle_in_place<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    // 从最后一个元素开始，与 [0, i] 中随机位置交换
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// 均匀随机抽取 `count` 个元素（部分 Fisher-Yates，只随机化前缀）
///
/// `count` 大于等于长度时等价于完整打乱。
pub fn sample<T: Clone, R: Rng + ?Sized>(items: &[T], count: usize, rng: &mut R) -> Vec<T> {
    let mut pool = items.to_vec();
    let len = pool.len();
    let count = count.min(len);

    for i in 0..count {
        let j = rng.gen_range(i..len);
        pool.swap(i, j);
    }

    pool.truncate(count);
    pool
}
