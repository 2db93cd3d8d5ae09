use tempfile::tempdir;
use twinledger_contracts::Devnet;
use twinledger_core::types::Network;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Run against a throwaway data dir
    let temp_dir = tempdir()?;
    println!("Using temporary directory: {:?}", temp_dir.path());

    let mut devnet = Devnet::open(temp_dir.path(), Network::Devnet).await?;

    println!("Creating accounts...");
    let minter = devnet.create_account("minter").await?;
    let user = devnet.create_account("user").await?;
    let l1_user = devnet.create_account("l1-user").await?;

    println!("Deploying the NFT bridge...");
    let (l2_addr, l1_addr) = devnet.deploy_bridge("Bootcamp", "BOOT", minter).await?;
    println!("L2 contract: {}", l2_addr);
    println!("L1 contract: {}", l1_addr);

    let (_, token_id) = devnet.nft_mint(minter, user).await?;
    println!("\nMinted token {} to {}", token_id, user.short());

    // L2 -> L1
    devnet.bridge_to_l1(user, l1_user, token_id).await?;
    println!("Token escrowed, owner on L2: {}", devnet.nft_owner_of(token_id)?.short());

    let report = devnet.flush().await?;
    println!("Flushed {} L2->L1 message(s)", report.from_l2.len());

    devnet.bridge_from_l2(l1_user, token_id).await?;
    println!("Claimed on L1, owner: {}", devnet.l1_owner_of(token_id)?.short());

    // L1 -> L2
    devnet.bridge_to_l2(l1_user, user, token_id).await?;
    let report = devnet.flush().await?;
    println!("\nFlushed {} L1->L2 message(s)", report.from_l1.len());
    println!("Owner back on L2: {}", devnet.nft_owner_of(token_id)?.short());
    println!("Owner on L1: {:?}", devnet.l1_owner_of(token_id).err());

    println!("\nRound trip completed, block height {}", devnet.block_height());

    Ok(())
}
