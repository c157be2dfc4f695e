use alloy::primitives::U256;

/// Fixed-point scale for every price the detector compares (1e18)
pub const SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);
/// Number of decimals in [`SCALE`]
pub const SCALE_DECIMALS: u8 = 18;
/// Basis point denominator (10,000 = 100%)
pub const BPS_DENOMINATOR: u64 = 10_000;
/// Uniswap V2 swap fee in basis points
pub const UNISWAP_V2_FEE_BPS: u64 = 30;
/// Aave V2 flash loan premium in basis points
pub const AAVE_V2_FLASH_PREMIUM_BPS: u64 = 9;
