/// Smallest power of two that is `>= n`. Zero maps to one.
#[inline]
pub fn next_power_of_two(n: u32) -> u32 {
    n.max(1).next_power_of_two()
}

#[inline]
pub fn is_power_of_two(n: u32) -> bool {
    n != 0 && n & (n - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_power_of_two_rounds_up() {
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(100), 128);
        assert_eq!(next_power_of_two(257), 512);
    }

    #[test]
    fn next_power_of_two_keeps_exact_powers() {
        for shift in 0..16 {
            assert_eq!(next_power_of_two(1 << shift), 1 << shift);
        }
    }

    #[test]
    fn zero_maps_to_one() {
        assert_eq!(next_power_of_two(0), 1);
        assert!(!is_power_of_two(0));
    }
}
