use ethers::contract::abigen;

abigen!(
    ProofAggregation,
    r#"[
        function verifyProofAggregation(uint256 domainId, uint256 aggregationId, bytes32 leaf, bytes32[] merklePath, uint256 leafCount, uint256 index) external view returns (bool)
    ]"#
);
