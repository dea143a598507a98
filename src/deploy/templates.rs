//! Contract source generation.
//!
//! The orchestrator only needs source text; it does not care how it is
//! produced. `ClarityTemplates` renders the three contracts from a
//! `DaoConfig` snapshot plus the addresses of already-deployed dependencies.

use crate::dao::allocation::split_supply;
use crate::dao::config::DaoConfig;

pub trait ContractTemplates: Send + Sync {
    fn token(&self, config: &DaoConfig) -> String;

    fn treasury(&self, config: &DaoConfig, token: &str) -> String;

    fn governance(&self, config: &DaoConfig, token: &str, treasury: &str) -> String;
}

/// Default Clarity contract templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClarityTemplates;

impl ContractTemplates for ClarityTemplates {
    fn token(&self, config: &DaoConfig) -> String {
        let split = split_supply(&config.total_supply, &config.splits);
        let token_name = config.contract_slug();

        format!(
            r#";; {name} governance token
(define-fungible-token {token_name} u{supply})

(define-constant deployer tx-sender)
(define-constant err-unauthorized (err u401))
(define-constant err-finalized (err u403))

(define-data-var distribution-open bool true)

(define-read-only (get-name) (ok "{name}"))
(define-read-only (get-symbol) (ok "{symbol}"))
(define-read-only (get-decimals) (ok u{decimals}))
(define-read-only (get-total-supply) (ok (ft-get-supply {token_name})))
(define-read-only (get-balance (who principal)) (ok (ft-get-balance {token_name} who)))

(define-public (transfer (amount uint) (sender principal) (recipient principal) (memo (optional (buff 34))))
  (begin
    (asserts! (is-eq tx-sender sender) err-unauthorized)
    (ft-transfer? {token_name} amount sender recipient)))

(define-private (mint-to (recipient principal) (amount uint))
  (begin
    (asserts! (is-eq tx-sender deployer) err-unauthorized)
    (asserts! (var-get distribution-open) err-finalized)
    (ft-mint? {token_name} amount recipient)))

;; founder u{founder}, participant pool u{pool}, treasury u{treasury}, verifier u{verifier}
(define-public (distribute-founder (recipient principal) (amount uint))
  (mint-to recipient amount))

(define-public (distribute-participant (recipient principal) (amount uint))
  (mint-to recipient amount))

(define-public (distribute-treasury (recipient principal) (amount uint))
  (mint-to recipient amount))

(define-public (distribute-verifier (recipient principal) (amount uint))
  (mint-to recipient amount))

(define-public (finalize-distribution)
  (begin
    (asserts! (is-eq tx-sender deployer) err-unauthorized)
    (ok (var-set distribution-open false))))
"#,
            name = config.name,
            symbol = config.symbol,
            decimals = config.decimals,
            supply = config.total_supply,
            founder = split.founder,
            pool = split.participant_pool,
            treasury = split.treasury,
            verifier = split.verifier,
        )
    }

    fn treasury(&self, config: &DaoConfig, token: &str) -> String {
        format!(
            r#";; {name} treasury
(define-constant token '{token})
(define-constant err-unauthorized (err u401))

(define-data-var governance (optional principal) none)

(define-public (set-governance (contract principal))
  (begin
    (asserts! (is-none (var-get governance)) err-unauthorized)
    (ok (var-set governance (some contract)))))

(define-read-only (get-token) token)

(define-public (withdraw-stx (amount uint) (recipient principal))
  (begin
    (asserts! (is-eq (some contract-caller) (var-get governance)) err-unauthorized)
    (as-contract (stx-transfer? amount tx-sender recipient))))
"#,
            name = config.name,
            token = token,
        )
    }

    fn governance(&self, config: &DaoConfig, token: &str, treasury: &str) -> String {
        let gov = &config.governance;
        format!(
            r#";; {name} governance
(define-constant token '{token})
(define-constant treasury '{treasury})
(define-constant voting-period u{voting_period})
(define-constant quorum-bp u{quorum})
(define-constant approval-bp u{approval})
(define-constant execution-delay u{delay})
(define-constant err-not-found (err u404))
(define-constant err-closed (err u409))

(define-data-var proposal-count uint u0)

(define-map proposals uint
  {{ proposer: principal, start: uint, votes-for: uint, votes-against: uint, executed: bool }})

(define-public (propose)
  (let ((id (+ (var-get proposal-count) u1)))
    (map-set proposals id
      {{ proposer: tx-sender, start: block-height, votes-for: u0, votes-against: u0, executed: false }})
    (var-set proposal-count id)
    (ok id)))

(define-public (vote (id uint) (support bool) (weight uint))
  (let ((proposal (unwrap! (map-get? proposals id) err-not-found)))
    (asserts! (< block-height (+ (get start proposal) voting-period)) err-closed)
    (ok (map-set proposals id
      (if support
        (merge proposal {{ votes-for: (+ (get votes-for proposal) weight) }})
        (merge proposal {{ votes-against: (+ (get votes-against proposal) weight) }}))))))
"#,
            name = config.name,
            token = token,
            treasury = treasury,
            voting_period = gov.voting_period_blocks,
            quorum = gov.quorum_bp,
            approval = gov.approval_threshold_bp,
            delay = gov.execution_delay_blocks,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::config::ConfigOverrides;

    fn config() -> DaoConfig {
        DaoConfig::default()
            .with_overrides(ConfigOverrides::named("River DAO", "RIVR"))
            .unwrap()
    }

    #[test]
    fn test_token_template_exposes_distribution_functions() {
        let source = ClarityTemplates.token(&config());
        for function in [
            "distribute-founder",
            "distribute-participant",
            "distribute-treasury",
            "distribute-verifier",
            "finalize-distribution",
        ] {
            assert!(
                source.contains(&format!("(define-public ({}", function)),
                "missing {}",
                function
            );
        }
        assert!(source.contains("(define-fungible-token rivr u1000000000000000)"));
        assert!(source.contains(r#"(ok "RIVR")"#));
    }

    #[test]
    fn test_dependent_templates_embed_addresses() {
        let token = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM.rivr-token";
        let treasury = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM.rivr-treasury";

        let treasury_source = ClarityTemplates.treasury(&config(), token);
        assert!(treasury_source.contains(&format!("'{}", token)));

        let governance_source = ClarityTemplates.governance(&config(), token, treasury);
        assert!(governance_source.contains(&format!("'{}", token)));
        assert!(governance_source.contains(&format!("'{}", treasury)));
        assert!(governance_source.contains("(define-constant voting-period u1440)"));
        assert!(governance_source.contains("{ proposer: principal"));
    }

    #[test]
    fn test_templates_are_deterministic() {
        assert_eq!(ClarityTemplates.token(&config()), ClarityTemplates.token(&config()));
    }
}
