//! ASCII rendering of received snapshots.

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use shared::{Direction, GameState, Map};
use std::io::{self, Write};

pub struct Renderer {
    map: Map,
}

impl Renderer {
    pub fn new(map: Map) -> Self {
        Self { map }
    }

    /// Builds the frame text: the map, bullets, live tanks and, once the
    /// match is decided, a banner under the arena.
    pub fn render(&self, state: &GameState) -> String {
        let width = self.map.width();
        let height = self.map.height();
        let mut grid: Vec<Vec<char>> = (0..height as i32)
            .map(|y| {
                (0..width as i32)
                    .map(|x| if self.map.is_wall(x, y) { '#' } else { ' ' })
                    .collect()
            })
            .collect();

        let mut put = |x: i32, y: i32, symbol: char| {
            if self.map.in_bounds(x, y) {
                grid[y as usize][x as usize] = symbol;
            }
        };
        for bullet in &state.bullets {
            put(bullet.x, bullet.y, '*');
        }
        for tank in state.tanks.iter().filter(|tank| tank.alive) {
            put(tank.x, tank.y, tank_symbol(tank.facing));
        }

        let mut frame = String::with_capacity((width + 1) * (height + 3));
        for row in grid {
            frame.extend(row);
            frame.push('\n');
        }

        frame.push_str(&format!(
            "Tanks alive: {}/{}\n",
            state.alive_count(),
            state.tanks.len()
        ));
        if state.game_over {
            frame.push_str("GAME OVER! ");
            match state.winner_id {
                Some(id) => frame.push_str(&format!("Winner is Player #{}\n", id)),
                None => frame.push_str("It's a draw!\n"),
            }
        }
        frame
    }

    /// Clears the terminal and draws `state`.
    pub fn draw(&self, state: &GameState) -> io::Result<()> {
        let frame = raw_lines(&self.render(state));
        let mut stdout = io::stdout().lock();
        queue!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        stdout.write_all(frame.as_bytes())?;
        stdout.flush()
    }
}

/// A raw-mode terminal does not return the carriage on a bare newline.
fn raw_lines(frame: &str) -> String {
    frame.replace('\n', "\r\n")
}

fn tank_symbol(facing: Direction) -> char {
    match facing {
        Direction::Up => '^',
        Direction::Down => 'v',
        Direction::Left => '<',
        Direction::Right => '>',
    }
}
