use anyhow::Result;
use clap::Subcommand;
use retreat_core::kanban::Column;
use retreat_core::workspace::Workspace;

use crate::render::render_board;

#[derive(Subcommand)]
pub enum BoardCommands {
    /// Show the board
    List,
    /// Add a card (lands in develop unless --column says otherwise)
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "develop")]
        column: String,
    },
    /// Move a card to another column
    Move {
        id: i64,
        #[arg(long)]
        to: String,
    },
    /// Delete a card
    Delete {
        id: i64,
    },
}

pub fn run(workspace: &Workspace, command: BoardCommands) -> Result<()> {
    match command {
        BoardCommands::List => {
            println!("{}", render_board(&workspace.board()));
            Ok(())
        }
        BoardCommands::Add {
            title,
            description,
            column,
        } => {
            let column = Column::from_name(&column)?;
            let mut board = workspace.board();
            let id = board.add_card(&title, &description, column)?;
            workspace.save_board(&board)?;
            println!("Added [{id}] to {}.", column.title());
            Ok(())
        }
        BoardCommands::Move { id, to } => {
            let to = Column::from_name(&to)?;
            let mut board = workspace.board();
            let (from, _) = board
                .find_card(id)
                .ok_or_else(|| anyhow::anyhow!("No card [{id}] on the board"))?;
            board.move_card(id, from, to)?;
            workspace.save_board(&board)?;
            println!("Moved [{id}] from {} to {}.", from.title(), to.title());
            Ok(())
        }
        BoardCommands::Delete { id } => {
            let mut board = workspace.board();
            let (column, _) = board
                .find_card(id)
                .ok_or_else(|| anyhow::anyhow!("No card [{id}] on the board"))?;
            board.delete_card(id, column);
            workspace.save_board(&board)?;
            println!("Deleted [{id}].");
            Ok(())
        }
    }
}
