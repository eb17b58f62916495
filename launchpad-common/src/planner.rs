//! Decides the next step of a launch from a ledger snapshot.
//!
//! Planning is a pure function of the request and a [`ChainState`]; nothing about earlier
//! steps is remembered. A run that is interrupted and started again therefore picks up exactly
//! where the ledger says it stands.

use alloy_primitives::U256;

use crate::models::{request::BPS_DENOMINATOR, ChainState, PoolCreationRequest, Step};

/// Returns the first outstanding step, or `None` once liquidity has been provided.
///
/// Priority, first match wins:
/// 1. the recipient already holds LP tokens of the pair: done;
/// 2. allowance below the desired token amount: `ApproveSpending`;
/// 3. no pair yet: `CreatePair`;
/// 4. otherwise `AddLiquidity`, also when the pair already has reserves from others.
///
/// Completion is judged by the recipient's LP balance alone. A recipient that already holds LP
/// tokens of the pair, e.g. from an earlier deposit, gets `None` even if this request's amounts
/// were never deposited; a second deposit needs a recipient without a balance in the pair.
pub fn plan(request: &PoolCreationRequest, state: &ChainState) -> Option<Step> {
    if state.pair_exists() && !state.provided_liquidity.is_zero() {
        return None;
    }

    if state.allowance < request.desired_token_amount {
        return Some(Step::ApproveSpending { amount: request.desired_token_amount });
    }

    if !state.pair_exists() {
        return Some(Step::CreatePair);
    }

    Some(Step::AddLiquidity {
        token_amount: request.desired_token_amount,
        pair_asset_amount: request.desired_pair_asset_amount,
        min_token_amount: min_amount(request.desired_token_amount, request.slippage_bps),
        min_pair_asset_amount: min_amount(request.desired_pair_asset_amount, request.slippage_bps),
        deadline: state
            .block_timestamp
            .saturating_add(request.deadline_offset_secs),
    })
}

/// `desired * (10_000 - slippage_bps) / 10_000`, rounded down.
///
/// Rounding up could produce a minimum the router cannot satisfy. Slippage above 100% is
/// clamped to a zero minimum.
pub fn min_amount(desired: U256, slippage_bps: u16) -> U256 {
    let denominator = U256::from(BPS_DENOMINATOR);
    let kept = denominator.saturating_sub(U256::from(slippage_bps));
    match desired.checked_mul(kept) {
        Some(product) => product / denominator,
        // Only reachable for amounts close to 2^256, divide first and accept the coarser floor.
        None => desired / denominator * kept,
    }
}

/// Whether `after` shows the effect `step` was submitted for.
///
/// `before` is the snapshot the step was planned from.
pub fn postcondition_holds(
    step: &Step,
    request: &PoolCreationRequest,
    before: &ChainState,
    after: &ChainState,
) -> bool {
    match step {
        Step::ApproveSpending { .. } => after.allowance >= request.desired_token_amount,
        Step::CreatePair => after.pair_exists(),
        Step::AddLiquidity { .. } => {
            after.pair_exists() && after.provided_liquidity > before.provided_liquidity
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, Address};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::models::Reserves;

    const TOKEN: Address = address!("1111111111111111111111111111111111111111");
    const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
    const PAIR: Address = address!("3333333333333333333333333333333333333333");

    fn request() -> PoolCreationRequest {
        PoolCreationRequest::new(TOKEN, WETH, U256::from(1000), U256::from(2_000_000))
    }

    fn state(allowance: u64, pair: Address, liquidity: u64) -> ChainState {
        ChainState::new(U256::from(allowance), pair, None, U256::from(liquidity), 1_700_000_000)
    }

    #[rstest]
    #[case(1_000_000, 500, 950_000)]
    #[case(1_000_000, 0, 1_000_000)]
    #[case(1_000_000, 10_000, 0)]
    #[case(999, 500, 949)] // 949.05
    #[case(19, 5000, 9)] // 9.5
    #[case(1, 1, 0)]
    fn test_min_amount_floors(#[case] desired: u64, #[case] bps: u16, #[case] expected: u64) {
        assert_eq!(min_amount(U256::from(desired), bps), U256::from(expected));
    }

    #[test]
    fn test_min_amount_does_not_overflow() {
        let min = min_amount(U256::MAX, 500);

        assert!(min < U256::MAX);
        assert_eq!(min, U256::MAX / U256::from(10_000) * U256::from(9_500));
    }

    #[test]
    fn test_min_amount_clamps_excessive_slippage() {
        assert_eq!(min_amount(U256::from(1000), 12_000), U256::ZERO);
    }

    #[test]
    fn test_fresh_launch_starts_with_approval() {
        let next = plan(&request(), &state(0, Address::ZERO, 0));

        assert_eq!(next, Some(Step::ApproveSpending { amount: U256::from(1000) }));
    }

    #[rstest]
    #[case::exact(1000)]
    #[case::over_approved(5000)]
    #[case::unlimited(u64::MAX)]
    fn test_sufficient_allowance_skips_approval(#[case] allowance: u64) {
        let next = plan(&request(), &state(allowance, Address::ZERO, 0));

        assert_eq!(next, Some(Step::CreatePair));
    }

    #[test]
    fn test_zero_token_amount_skips_approval() {
        let mut req = request();
        req.desired_token_amount = U256::ZERO;

        assert_eq!(plan(&req, &state(0, Address::ZERO, 0)), Some(Step::CreatePair));
    }

    #[test]
    fn test_existing_pair_goes_straight_to_liquidity() {
        let next = plan(&request(), &state(1000, PAIR, 0));

        assert_eq!(
            next,
            Some(Step::AddLiquidity {
                token_amount: U256::from(1000),
                pair_asset_amount: U256::from(2_000_000),
                min_token_amount: U256::from(950),
                min_pair_asset_amount: U256::from(1_900_000),
                deadline: 1_700_000_000 + 1200,
            })
        );
    }

    #[test]
    fn test_pair_with_foreign_reserves_still_gets_liquidity() {
        let mut snapshot = state(1000, PAIR, 0);
        snapshot.reserves = Some(Reserves {
            token_reserve: U256::from(50),
            pair_asset_reserve: U256::from(60),
        });

        let next = plan(&request(), &snapshot);

        assert_eq!(next.map(|s| s.kind()), Some(crate::models::StepKind::AddLiquidity));
    }

    #[test]
    fn test_revoked_allowance_is_requested_again() {
        // Pair exists but someone reset the allowance out of band.
        let next = plan(&request(), &state(0, PAIR, 0));

        assert_eq!(next, Some(Step::ApproveSpending { amount: U256::from(1000) }));
    }

    #[test]
    fn test_provided_liquidity_completes_the_launch() {
        // The router consumed the allowance while adding liquidity.
        assert_eq!(plan(&request(), &state(0, PAIR, 1)), None);
    }

    #[rstest]
    #[case(state(0, Address::ZERO, 0))]
    #[case(state(1000, Address::ZERO, 0))]
    #[case(state(1000, PAIR, 0))]
    #[case(state(0, PAIR, 10))]
    fn test_planning_is_idempotent(#[case] snapshot: ChainState) {
        let req = request();

        assert_eq!(plan(&req, &snapshot), plan(&req, &snapshot));
    }

    #[rstest]
    #[case(state(0, Address::ZERO, 0))]
    #[case(state(999, Address::ZERO, 0))]
    #[case(state(1000, Address::ZERO, 0))]
    #[case(state(7000, PAIR, 0))]
    #[case(state(0, PAIR, 0))]
    fn test_planned_step_is_never_already_satisfied(#[case] snapshot: ChainState) {
        let req = request();

        if let Some(step) = plan(&req, &snapshot) {
            assert!(!postcondition_holds(&step, &req, &snapshot, &snapshot));
        }
    }

    #[test]
    fn test_add_liquidity_postcondition_needs_new_lp_tokens() {
        let req = request();
        let before = state(1000, PAIR, 0);
        let step = plan(&req, &before).unwrap();

        assert!(!postcondition_holds(&step, &req, &before, &state(0, PAIR, 0)));
        assert!(postcondition_holds(&step, &req, &before, &state(0, PAIR, 31)));
    }

    #[test]
    fn test_approval_postcondition_accepts_over_approval() {
        let req = request();
        let before = state(0, Address::ZERO, 0);
        let step = Step::ApproveSpending { amount: U256::from(1000) };

        assert!(postcondition_holds(&step, &req, &before, &state(u64::MAX, Address::ZERO, 0)));
        assert!(!postcondition_holds(&step, &req, &before, &state(999, Address::ZERO, 0)));
    }
}
